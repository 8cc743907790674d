//! PDF fixtures built in memory with lopdf.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Smallest byte sequence the image path recognizes as JPEG.
pub const JPEG_A: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0xFF, 0xD9,
];
pub const JPEG_B: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x08, 0x06, 0x06, 0x07, 0x06, 0xFF, 0xD9,
];

pub const INTRO_TEXT: &str = "Quarterly report for the northern region";
pub const CLOSING_TEXT: &str = "End of report";

/// Cells of the table laid out on page 2.
pub const TABLE: [[&str; 3]; 3] = [
    ["Name", "Qty", "Price"],
    ["Apple", "3", "1.20"],
    ["Pear", "5", "0.80"],
];
const TABLE_COLUMNS: [i64; 3] = [72, 200, 330];
const TABLE_TOP: i64 = 700;
const TABLE_ROW_STEP: i64 = 20;

/// Three pages: prose with two JPEG images, a three-column table, prose.
pub fn report_pdf() -> Vec<u8> {
    let mut builder = Builder::new();
    let font = builder.font();

    let images = vec![
        ("Im1", builder.jpeg(JPEG_A, 2, 2)),
        ("Im2", builder.jpeg(JPEG_B, 4, 3)),
    ];
    let mut ops = text_line(INTRO_TEXT, 72, 760);
    for (name, _) in &images {
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        ops.push(Operation::new("Q", vec![]));
    }
    builder.page(ops, font, &images);

    let mut ops = Vec::new();
    for (r, row) in TABLE.iter().enumerate() {
        let y = TABLE_TOP - TABLE_ROW_STEP * r as i64;
        for (cell, &x) in row.iter().zip(TABLE_COLUMNS.iter()) {
            ops.extend(text_line(cell, x, y));
        }
    }
    builder.page(ops, font, &[]);

    builder.page(text_line(CLOSING_TEXT, 72, 760), font, &[]);

    builder.finish()
}

/// Single page of prose, no images, no tables.
pub fn text_pdf(text: &str) -> Vec<u8> {
    let mut builder = Builder::new();
    let font = builder.font();
    builder.page(text_line(text, 72, 700), font, &[]);
    builder.finish()
}

/// Single page of prose in Helvetica whose resources also carry an unused
/// Type0 Identity-H font with no ToUnicode map.
pub fn unused_cid_font_pdf(text: &str) -> Vec<u8> {
    let mut builder = Builder::new();
    let font = builder.font();
    let cid = builder.cid_font();
    builder.page_with_fonts(text_line(text, 72, 700), &[("F1", font), ("F2", cid)], &[]);
    builder.finish()
}

fn text_line(text: &str, x: i64, y: i64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 10.into()]),
        Operation::new(
            "Tm",
            vec![1.into(), 0.into(), 0.into(), 1.into(), x.into(), y.into()],
        ),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

struct Builder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Builder {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn font(&mut self) -> ObjectId {
        self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        })
    }

    fn cid_font(&mut self) -> ObjectId {
        self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "NotoSansCJKjp-Regular",
            "Encoding" => "Identity-H",
        })
    }

    fn jpeg(&mut self, data: &[u8], width: i64, height: i64) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        };
        self.doc
            .add_object(Stream::new(dict, data.to_vec()).with_compression(false))
    }

    fn page(&mut self, ops: Vec<Operation>, font: ObjectId, images: &[(&str, ObjectId)]) {
        self.page_with_fonts(ops, &[("F1", font)], images);
    }

    fn page_with_fonts(
        &mut self,
        ops: Vec<Operation>,
        fonts: &[(&str, ObjectId)],
        images: &[(&str, ObjectId)],
    ) {
        let content = Content { operations: ops };
        let content_id = self.doc.add_object(
            Stream::new(dictionary! {}, content.encode().unwrap()).with_compression(false),
        );

        let mut font_dict = Dictionary::new();
        for (name, id) in fonts {
            font_dict.set(*name, *id);
        }
        let mut resources = dictionary! {
            "Font" => font_dict,
        };
        if !images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, id) in images {
                xobjects.set(*name, *id);
            }
            resources.set("XObject", xobjects);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
    }

    fn finish(mut self) -> Vec<u8> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        self.doc.save_to(&mut out).unwrap();
        out
    }
}

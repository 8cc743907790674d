//! Embedded image discovery.
//!
//! Images are found by walking a page's `/Resources /XObject` dictionary in
//! stored order, following `/Parent` for inherited resources and descending
//! into Form XObjects. An image placed several times on a page, or reachable
//! through several forms, is reported once per reference.

use std::collections::HashSet;
use std::io::Read;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{EmbeddedImage, ImageFormat};

/// Upper bound on `/Parent` hops when looking for inherited resources.
const MAX_PARENT_DEPTH: usize = 32;

/// Collect every image referenced by a page, in discovery order.
pub fn collect_page_images(doc: &Document, page_id: ObjectId) -> Result<Vec<EmbeddedImage>> {
    let mut images = Vec::new();

    let Some(resources) = page_resources(doc, page_id)? else {
        return Ok(images);
    };

    let mut visited_forms = HashSet::new();
    walk_xobjects(doc, resources, &mut visited_forms, &mut images)?;

    Ok(images)
}

/// Find the resource dictionary of a page, inheriting from ancestors.
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>> {
    let mut node = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::ImageExtract(format!("Page object {:?}: {}", page_id, e)))?;

    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(res) = node.get(b"Resources") {
            return Ok(resolve_dict(doc, res));
        }

        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => match doc.get_dictionary(parent) {
                Ok(dict) => node = dict,
                Err(_) => return Ok(None),
            },
            Err(_) => return Ok(None),
        }
    }

    Ok(None)
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(r) => doc.get_dictionary(*r).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

fn walk_xobjects(
    doc: &Document,
    resources: &Dictionary,
    visited_forms: &mut HashSet<ObjectId>,
    images: &mut Vec<EmbeddedImage>,
) -> Result<()> {
    let Some(xobjects) = resources
        .get(b"XObject")
        .ok()
        .and_then(|x| resolve_dict(doc, x))
    else {
        return Ok(());
    };

    for (name, obj) in xobjects.iter() {
        let Ok(obj_ref) = obj.as_reference() else {
            continue;
        };

        let stream = match doc.get_object(obj_ref) {
            Ok(Object::Stream(stream)) => stream,
            Ok(_) => continue,
            Err(e) => {
                return Err(Error::ImageExtract(format!(
                    "XObject /{} ({:?}): {}",
                    String::from_utf8_lossy(name),
                    obj_ref,
                    e
                )))
            }
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name_str) {
            Ok("Image") => {
                let image = decode_image(stream)?.with_name(String::from_utf8_lossy(name));
                images.push(image);
            }
            Ok("Form") => {
                if !visited_forms.insert(obj_ref) {
                    continue;
                }
                if let Some(form_res) = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|r| resolve_dict(doc, r))
                {
                    walk_xobjects(doc, form_res, visited_forms, images)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Decode an image XObject into its native encoded bytes.
fn decode_image(stream: &Stream) -> Result<EmbeddedImage> {
    let dict = &stream.dict;
    let filters = stream_filters(dict);

    let (data, format) = match filters.split_last() {
        Some((last, leading)) if ImageFormat::from_filter(last).is_some() => {
            let data = decode_stages(leading, &stream.content)
                .map_err(|e| Error::ImageExtract(format!("{} ahead of {}", e, last)))?;
            (data, ImageFormat::from_filter(last).unwrap_or(ImageFormat::Raw))
        }
        _ => {
            let data = match decode_stages(&filters, &stream.content) {
                Ok(data) => data,
                Err(e) => {
                    log::debug!("Keeping stored image bytes, filters {:?}: {}", filters, e);
                    stream.content.clone()
                }
            };
            let format = ImageFormat::detect(&data).unwrap_or(ImageFormat::Raw);
            (data, format)
        }
    };

    let mut image = EmbeddedImage::new(data, format);

    let width = dict.get(b"Width").and_then(Object::as_i64).ok();
    let height = dict.get(b"Height").and_then(Object::as_i64).ok();
    if let (Some(w), Some(h)) = (width, height) {
        image = image.with_dimensions(w as u32, h as u32);
    }

    if let Ok(bits) = dict.get(b"BitsPerComponent").and_then(Object::as_i64) {
        image = image.with_bits_per_component(bits as u8);
    }

    if let Ok(cs) = dict.get(b"ColorSpace") {
        let cs_name = match cs {
            Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
            Object::Array(arr) => arr
                .first()
                .and_then(|o| o.as_name_str().ok())
                .map(String::from),
            _ => None,
        };
        if let Some(cs_name) = cs_name {
            image = image.with_color_space(cs_name);
        }
    }

    Ok(image)
}

/// Filter names applied to a stream, outermost first.
fn stream_filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).to_string()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name_str().ok())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Undo generic filter stages in order. `DecodeParms` predictors are not reversed.
fn decode_stages(filters: &[String], data: &[u8]) -> Result<Vec<u8>> {
    filters
        .iter()
        .try_fold(data.to_vec(), |data, filter| decode_stage(filter, &data))
}

fn decode_stage(filter: &str, data: &[u8]) -> Result<Vec<u8>> {
    match filter {
        "FlateDecode" | "Fl" => inflate(data),
        "ASCIIHexDecode" | "AHx" => ascii_hex(data),
        "ASCII85Decode" | "A85" => ascii85(data),
        "RunLengthDecode" | "RL" => Ok(run_length(data)),
        other => Err(Error::ImageExtract(format!("Unsupported filter {}", other))),
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::ImageExtract(format!("FlateDecode: {}", e)))?;
    Ok(out)
}

/// Hex pairs up to `>`; whitespace is ignored and an odd final digit is
/// padded with 0.
fn ascii_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &b in data {
        if b == b'>' {
            break;
        }
        if b.is_ascii_whitespace() {
            continue;
        }
        let digit = (b as char)
            .to_digit(16)
            .ok_or_else(|| Error::ImageExtract(format!("ASCIIHexDecode: bad byte 0x{:02X}", b)))?
            as u8;
        match high.take() {
            Some(h) => out.push(h << 4 | digit),
            None => high = Some(digit),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}

/// Base-85 groups, optional `<~` prefix, terminated by `~>`.
fn ascii85(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);
    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group: u64 = 0;
    let mut count = 0usize;

    for &b in data {
        match b {
            b'~' => break,
            b'z' if count == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group = group * 85 + (b - b'!') as u64;
                count += 1;
                if count == 5 {
                    out.extend_from_slice(&group_bytes(group)?);
                    group = 0;
                    count = 0;
                }
            }
            _ if b.is_ascii_whitespace() => {}
            _ => {
                return Err(Error::ImageExtract(format!(
                    "ASCII85Decode: bad byte 0x{:02X}",
                    b
                )))
            }
        }
    }

    if count == 1 {
        return Err(Error::ImageExtract("ASCII85Decode: dangling final byte".into()));
    }
    if count > 1 {
        for _ in count..5 {
            group = group * 85 + 84;
        }
        out.extend_from_slice(&group_bytes(group)?[..count - 1]);
    }
    Ok(out)
}

fn group_bytes(group: u64) -> Result<[u8; 4]> {
    u32::try_from(group)
        .map(u32::to_be_bytes)
        .map_err(|_| Error::ImageExtract("ASCII85Decode: group out of range".into()))
}

/// PackBits-style runs; 128 ends the data.
fn run_length(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let len = data[i] as usize;
        i += 1;
        match len {
            0..=127 => {
                let end = (i + len + 1).min(data.len());
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            128 => break,
            _ => {
                if let Some(&b) = data.get(i) {
                    out.extend(std::iter::repeat(b).take(257 - len));
                }
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use lopdf::dictionary;
    use std::io::Write;

    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0xFF, 0xD9];

    fn image_stream(filter: Object, content: Vec<u8>) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => filter,
        };
        Stream::new(dict, content).with_compression(false)
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_dct_bytes_kept_verbatim() {
        let stream = image_stream(Object::Name(b"DCTDecode".to_vec()), JPEG_BYTES.to_vec());
        let image = decode_image(&stream).unwrap();

        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(image.data, JPEG_BYTES);
        assert_eq!(image.width, Some(1));
        assert_eq!(image.color_space.as_deref(), Some("DeviceRGB"));
        assert_eq!(image.bits_per_component, Some(8));
    }

    #[test]
    fn test_flate_ahead_of_dct_is_inflated() {
        let filters = Object::Array(vec![
            Object::Name(b"FlateDecode".to_vec()),
            Object::Name(b"DCTDecode".to_vec()),
        ]);
        let stream = image_stream(filters, deflate(JPEG_BYTES));
        let image = decode_image(&stream).unwrap();

        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(image.data, JPEG_BYTES);
    }

    #[test]
    fn test_ascii_hex_ahead_of_dct_is_decoded() {
        let filters = Object::Array(vec![
            Object::Name(b"ASCIIHexDecode".to_vec()),
            Object::Name(b"DCTDecode".to_vec()),
        ]);
        let stream = image_stream(filters, b"FFD8FFE0 00104A46\n4946FFD9>".to_vec());
        let image = decode_image(&stream).unwrap();

        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(image.data, JPEG_BYTES);
    }

    #[test]
    fn test_ascii85_ahead_of_dct_is_decoded() {
        let filters = Object::Array(vec![
            Object::Name(b"ASCII85Decode".to_vec()),
            Object::Name(b"DCTDecode".to_vec()),
        ]);
        let stream = image_stream(filters, br#"<~s4IA0!"_al8Oia5~>"#.to_vec());
        let image = decode_image(&stream).unwrap();

        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(image.data, JPEG_BYTES);
    }

    #[test]
    fn test_run_length_then_flate_ahead_of_dct() {
        let mut packed = vec![(JPEG_BYTES.len() - 1) as u8];
        packed.extend_from_slice(JPEG_BYTES);
        packed.push(128);

        let filters = Object::Array(vec![
            Object::Name(b"FlateDecode".to_vec()),
            Object::Name(b"RunLengthDecode".to_vec()),
            Object::Name(b"DCTDecode".to_vec()),
        ]);
        let stream = image_stream(filters, deflate(&packed));
        let image = decode_image(&stream).unwrap();

        assert_eq!(image.data, JPEG_BYTES);
    }

    #[test]
    fn test_text_filters() {
        assert_eq!(ascii_hex(b"48 65 6c6C6F>").unwrap(), b"Hello");
        assert_eq!(ascii_hex(b"7").unwrap(), vec![0x70]);
        assert!(ascii_hex(b"4G").is_err());

        assert_eq!(ascii85(b"<~87cURD_*#MA7fmsAon~>").unwrap(), b"Hello, pdfsift");
        assert_eq!(ascii85(b"zz~>").unwrap(), vec![0u8; 8]);
        assert!(ascii85(b"abc{").is_err());

        assert_eq!(run_length(&[2, b'a', b'b', b'c', 254, b'x', 128, b'q']), b"abcxxx");
    }

    #[test]
    fn test_flate_compressed_samples_are_inflated_raw() {
        let samples = vec![10u8, 20, 30, 40, 50, 60];
        let stream = image_stream(Object::Name(b"FlateDecode".to_vec()), deflate(&samples));
        let image = decode_image(&stream).unwrap();

        assert_eq!(image.format, ImageFormat::Raw);
        assert_eq!(image.data, samples);
    }

    #[test]
    fn test_unsupported_chain_is_an_error() {
        let filters = Object::Array(vec![
            Object::Name(b"LZWDecode".to_vec()),
            Object::Name(b"DCTDecode".to_vec()),
        ]);
        let stream = image_stream(filters, JPEG_BYTES.to_vec());
        assert!(matches!(decode_image(&stream), Err(Error::ImageExtract(_))));
    }

    #[test]
    fn test_uncompressed_samples_are_raw() {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 1,
            "BitsPerComponent" => 8,
        };
        let stream = Stream::new(dict, vec![0u8; 6]).with_compression(false);
        let image = decode_image(&stream).unwrap();

        assert_eq!(image.format, ImageFormat::Raw);
        assert_eq!(image.data.len(), 6);
    }

    #[test]
    fn test_stream_filters() {
        assert!(stream_filters(&dictionary! {}).is_empty());
        assert_eq!(
            stream_filters(&dictionary! { "Filter" => "JPXDecode" }),
            vec!["JPXDecode".to_string()]
        );
    }

    #[test]
    fn test_page_walk_follows_forms_and_keeps_duplicates() {
        let mut doc = Document::with_version("1.5");

        let image_id = doc.add_object(image_stream(
            Object::Name(b"DCTDecode".to_vec()),
            JPEG_BYTES.to_vec(),
        ));

        // A form that draws the image and also refers back to itself.
        let form_id = doc.new_object_id();
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "ImF" => image_id,
                        "Self" => form_id,
                    },
                },
            },
            b"/ImF Do".to_vec(),
        );
        doc.objects.insert(form_id, Object::Stream(form));

        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im1" => image_id,
                        "Fm1" => form_id,
                    },
                },
            }),
        );

        let images = collect_page_images(&doc, page_id).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name.as_deref(), Some("Im1"));
        assert_eq!(images[1].name.as_deref(), Some("ImF"));
        assert!(images.iter().all(|i| i.format == ImageFormat::Jpeg));
    }

    #[test]
    fn test_dangling_image_reference_is_an_error() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => (999, 0) },
            },
        });

        assert!(matches!(
            collect_page_images(&doc, page_id),
            Err(Error::ImageExtract(_))
        ));
    }
}

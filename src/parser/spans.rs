//! Positioned text spans for table detection.
//!
//! Walks a page's content stream and records every shown string together
//! with its text-space origin and effective font size. Only the text state
//! operators that move the pen are interpreted; graphics state is ignored.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Encoding, Object, ObjectId};

use crate::error::{Error, Result};

/// Average glyph advance as a fraction of the font size, used to estimate
/// span widths without font metrics.
const AVG_GLYPH_ADVANCE: f32 = 0.5;

/// TJ adjustment (thousandths of an em) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A shown string with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Left edge in user space
    pub x: f32,
    /// Baseline in user space
    pub y: f32,
    /// Estimated advance width
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a span, estimating its width from the character count.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = text.chars().count() as f32 * font_size * AVG_GLYPH_ADVANCE;
        Self {
            text,
            x,
            y,
            width,
            font_size,
        }
    }

    /// Right edge in user space.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Extracts [`TextSpan`]s and plain text from the pages of a loaded document.
///
/// Font encodings are resolved when a `Tf` selects the font. A font lopdf
/// cannot build an encoding for is logged and its strings are decoded with
/// [`decode_fallback`]; it never fails the page.
pub struct SpanExtractor<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> SpanExtractor<'a> {
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Spans of one page (1-based page number), in content-stream order.
    pub fn page_spans(&self, page_num: u32) -> Result<Vec<TextSpan>> {
        let Some((content, fonts)) = self.load_page(page_num)? else {
            return Ok(Vec::new());
        };

        let mut spans = Vec::new();
        let mut state = TextState::default();
        let mut encoding: Option<Encoding<'a>> = None;
        let mut in_text = false;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "BT" => {
                    in_text = true;
                    state.begin_text();
                }
                "ET" => in_text = false,
                "Tf" => {
                    encoding = self.select_font(operands.first(), &fonts);
                    state.font_size = operands.get(1).and_then(number).unwrap_or(12.0);
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        state.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    let tx = operands.first().and_then(number).unwrap_or(0.0);
                    let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate(tx, ty);
                }
                "Tm" => {
                    if operands.len() >= 6 {
                        let m: Vec<f32> = operands.iter().map(|o| number(o).unwrap_or(0.0)).collect();
                        state.set_matrix([m[0], m[1], m[2], m[3], m[4], m[5]]);
                    }
                }
                "T*" => state.next_line(),
                "Tj" | "TJ" if in_text => {
                    if let Some(text) = shown_text(operands.first(), encoding.as_ref()) {
                        state.emit(text, &mut spans);
                    }
                }
                "'" | "\"" => {
                    state.next_line();
                    if in_text {
                        if let Some(text) = shown_text(operands.last(), encoding.as_ref()) {
                            state.emit(text, &mut spans);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(spans)
    }

    /// Text of one page (1-based page number): shown strings in
    /// content-stream order, each text object ending with a newline.
    pub fn page_text(&self, page_num: u32) -> Result<String> {
        let Some((content, fonts)) = self.load_page(page_num)? else {
            return Ok(String::new());
        };

        let mut text = String::new();
        let mut encoding: Option<Encoding<'a>> = None;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "Tf" => encoding = self.select_font(operands.first(), &fonts),
                "Tj" | "TJ" => {
                    if let Some(shown) = shown_text(operands.first(), encoding.as_ref()) {
                        text.push_str(&shown);
                    }
                }
                "'" | "\"" => {
                    end_line(&mut text);
                    if let Some(shown) = shown_text(operands.last(), encoding.as_ref()) {
                        text.push_str(&shown);
                    }
                }
                "ET" => end_line(&mut text),
                _ => {}
            }
        }

        Ok(text)
    }

    /// Decoded content and font table of a page; `None` if it has no content.
    #[allow(clippy::type_complexity)]
    fn load_page(&self, page_num: u32) -> Result<Option<(Content, BTreeMap<Vec<u8>, &'a Dictionary>)>> {
        let pages = self.doc.get_pages();
        let page_id = *pages.get(&page_num).ok_or_else(|| {
            Error::PdfParse(format!(
                "Page {} is out of range (document has {} pages)",
                page_num,
                pages.len()
            ))
        })?;

        let doc: &'a LopdfDocument = self.doc;
        let fonts = doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let content = self.page_content(page_id)?;
        if content.is_empty() {
            return Ok(None);
        }
        let content = Content::decode(&content).map_err(|e| Error::PdfParse(e.to_string()))?;
        Ok(Some((content, fonts)))
    }

    /// Concatenated, decoded content streams of a page.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let refs: Vec<ObjectId> = match page_dict.get(b"Contents") {
            Ok(Object::Reference(r)) => vec![*r],
            Ok(Object::Array(arr)) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            _ => return Ok(Vec::new()),
        };

        let mut content = Vec::new();
        for r in refs {
            match self.doc.get_object(r) {
                Ok(Object::Stream(s)) => {
                    let data = s
                        .decompressed_content()
                        .unwrap_or_else(|_| s.content.clone());
                    content.extend_from_slice(&data);
                    content.push(b'\n');
                }
                _ => log::debug!("Skipping content reference {:?}", r),
            }
        }
        Ok(content)
    }

    /// Encoding for the font named by a `Tf` operand.
    fn select_font(
        &self,
        name: Option<&Object>,
        fonts: &BTreeMap<Vec<u8>, &'a Dictionary>,
    ) -> Option<Encoding<'a>> {
        let Some(Object::Name(name)) = name else {
            return None;
        };
        let Some(font) = fonts.get(name).copied() else {
            log::debug!("Font /{} is not in the page resources", String::from_utf8_lossy(name));
            return None;
        };

        match font.get_font_encoding(self.doc) {
            Ok(encoding) => Some(encoding),
            Err(e) => {
                log::debug!(
                    "Font /{} has no usable encoding ({}), decoding raw bytes",
                    String::from_utf8_lossy(name),
                    e
                );
                None
            }
        }
    }
}

/// Text shown by a `Tj`/`TJ`/`'`/`"` operand.
fn shown_text(operand: Option<&Object>, encoding: Option<&Encoding>) -> Option<String> {
    match operand? {
        Object::String(bytes, _) => Some(decode(encoding, bytes)),
        Object::Array(items) => Some(join_tj(items, |b| decode(encoding, b))),
        _ => None,
    }
}

/// Decode a string operand with the current font's encoding.
fn decode(encoding: Option<&Encoding>, bytes: &[u8]) -> String {
    match encoding {
        Some(enc) => LopdfDocument::decode_text(enc, bytes).unwrap_or_else(|_| decode_fallback(bytes)),
        None => decode_fallback(bytes),
    }
}

fn end_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

/// Text matrix and the bits of text state that affect positioning.
#[derive(Debug, Clone)]
struct TextState {
    /// Text line matrix `[a b c d e f]`
    line: [f32; 6],
    font_size: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            line: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.line = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    }

    fn set_matrix(&mut self, m: [f32; 6]) {
        self.line = m;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line[4] = e + tx * a + ty * c;
        self.line[5] = f + tx * b + ty * d;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.translate(0.0, -leading);
    }

    fn scale(&self) -> f32 {
        let [a, _, c, ..] = self.line;
        (a * a + c * c).sqrt()
    }

    fn emit(&self, text: String, spans: &mut Vec<TextSpan>) {
        if text.trim().is_empty() {
            return;
        }
        spans.push(TextSpan::new(
            text,
            self.line[4],
            self.line[5],
            self.font_size * self.scale(),
        ));
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Join the strings of a `TJ` array, turning large negative kerns into spaces.
fn join_tj<F>(items: &[Object], decode: F) -> String
where
    F: Fn(&[u8]) -> String,
{
    let mut joined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => joined.push_str(&decode(bytes)),
            other => {
                let Some(adjust) = number(other) else { continue };
                let wants_space = -adjust > TJ_SPACE_THRESHOLD
                    && joined
                        .chars()
                        .last()
                        .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script(c));
                if wants_space {
                    joined.push(' ');
                }
            }
        }
    }
    joined
}

/// Scripts written without inter-word spaces (Han, kana, CJK punctuation).
fn is_spaceless_script(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F
        | 0x3040..=0x30FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0x20000..=0x2EBEF)
}

/// UTF-16BE with BOM, then UTF-8, then Latin-1.
fn decode_fallback(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

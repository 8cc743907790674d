//! Embedded raster images and their data-URI form.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Native encoded format of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Baseline/progressive JPEG (`DCTDecode`)
    Jpeg,
    /// JPEG 2000 codestream (`JPXDecode`)
    Jpx,
    /// JBIG2 bilevel data (`JBIG2Decode`)
    Jbig2,
    /// CCITT Group 3/4 fax data (`CCITTFaxDecode`)
    Ccitt,
    /// PNG file stored as-is in the stream
    Png,
    /// GIF file stored as-is in the stream
    Gif,
    /// TIFF file stored as-is in the stream
    Tiff,
    /// BMP file stored as-is in the stream
    Bmp,
    /// WEBP file stored as-is in the stream
    Webp,
    /// Sample data with no container.
    ///
    /// Generic filters (Flate, ASCIIHex, ASCII85, RunLength) are undone, so
    /// the payload is the uncompressed samples rather than the stored stream
    /// bytes; predictors are left in place. When a filter cannot be undone
    /// (LZW, for one) the stored bytes are kept unchanged.
    Raw,
}

impl ImageFormat {
    /// File extension used in the `data:image/<ext>` prefix.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Jpx => "jpx",
            ImageFormat::Jbig2 => "jb2",
            ImageFormat::Ccitt => "ccitt",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Webp => "webp",
            ImageFormat::Raw => "raw",
        }
    }

    /// MIME type, e.g. `image/jpeg`.
    pub fn mime_type(&self) -> String {
        format!("image/{}", self.extension())
    }

    /// Map a PDF image filter name to the format it leaves the bytes in.
    ///
    /// Returns `None` for generic compression filters (Flate, LZW, ...),
    /// whose output is plain sample data.
    pub fn from_filter(filter: &str) -> Option<Self> {
        match filter {
            "DCTDecode" | "DCT" => Some(ImageFormat::Jpeg),
            "JPXDecode" => Some(ImageFormat::Jpx),
            "JBIG2Decode" => Some(ImageFormat::Jbig2),
            "CCITTFaxDecode" | "CCF" => Some(ImageFormat::Ccitt),
            _ => None,
        }
    }

    /// Detect a container format from magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }

        // TIFF: little-endian or big-endian byte order mark
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some(ImageFormat::Tiff);
        }

        if data.starts_with(b"BM") {
            return Some(ImageFormat::Bmp);
        }

        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::Webp);
        }

        // JPEG 2000 signature box, or a bare codestream (FF 4F FF 51)
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20])
            || data.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
        {
            return Some(ImageFormat::Jpx);
        }

        None
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A raster image embedded in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Encoded bytes, exactly as stored (minus generic compression)
    pub data: Vec<u8>,

    /// Native format of `data`
    pub format: ImageFormat,

    /// Resource name on the page (e.g., "Im1")
    pub name: Option<String>,

    /// Width in pixels
    pub width: Option<u32>,

    /// Height in pixels
    pub height: Option<u32>,

    /// Color space (e.g., "DeviceRGB")
    pub color_space: Option<String>,

    /// Bits per component (e.g., 8)
    pub bits_per_component: Option<u8>,
}

impl EmbeddedImage {
    /// Create a new image from its bytes and format.
    pub fn new(data: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            data,
            format,
            name: None,
            width: None,
            height: None,
            color_space: None,
            bits_per_component: None,
        }
    }

    /// Create a JPEG image.
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self::new(data, ImageFormat::Jpeg)
    }

    /// Set the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set color space.
    pub fn with_color_space(mut self, color_space: impl Into<String>) -> Self {
        self.color_space = Some(color_space.into());
        self
    }

    /// Set bits per component.
    pub fn with_bits_per_component(mut self, bits: u8) -> Self {
        self.bits_per_component = Some(bits);
        self
    }

    /// Size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Extension of the native format.
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// Render as `data:image/<ext>;base64,<payload>`.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/{};base64,{}",
            self.extension(),
            BASE64.encode(&self.data)
        )
    }

    /// Consume the image into its data URI, dropping the raw bytes.
    pub fn into_data_uri(self) -> String {
        self.to_data_uri()
    }
}

/// Split a `data:image/<ext>;base64,<payload>` string into extension and
/// decoded bytes.
pub fn parse_data_uri(uri: &str) -> Option<(&str, Vec<u8>)> {
    let rest = uri.strip_prefix("data:image/")?;
    let (ext, payload) = rest.split_once(";base64,")?;
    if ext.is_empty() {
        return None;
    }
    let data = BASE64.decode(payload).ok()?;
    Some((ext, data))
}

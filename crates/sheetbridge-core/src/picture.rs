//! Pictures placed on a worksheet

use crate::cell::CellAddress;

/// Size given to images whose dimensions cannot be read
pub const DEFAULT_PICTURE_SIZE: f64 = 100.0;

/// An image anchored to a worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    /// Sheet-unique name (`Picture 1`, ...)
    pub name: String,
    /// Raw image bytes
    pub image: Vec<u8>,
    /// Top-left cell the picture is placed in
    pub anchor: CellAddress,
    /// Offset from the anchor, in points
    pub left: f64,
    pub top: f64,
    /// Size in points
    pub width: f64,
    pub height: f64,
}

impl Picture {
    /// Create a picture sized from the image header when possible
    pub fn new(name: impl Into<String>, image: Vec<u8>, anchor: CellAddress) -> Self {
        let (width, height) = image_size(&image)
            .map(|(w, h)| (w as f64, h as f64))
            .unwrap_or((DEFAULT_PICTURE_SIZE, DEFAULT_PICTURE_SIZE));
        Self {
            name: name.into(),
            image,
            anchor,
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Pixel dimensions of a PNG image, read from its IHDR chunk
pub fn image_size(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || !bytes.starts_with(PNG_SIGNATURE) || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

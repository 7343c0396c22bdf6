use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SniffError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("truncated {0} header")]
    Truncated(ImageFormat),
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Identify an image from its signature bytes and read its dimensions
/// without decoding the pixel data.
pub fn sniff_image(bytes: &[u8]) -> Result<ImageInfo, SniffError> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        return sniff_png(bytes);
    }
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return sniff_jpeg(bytes);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return sniff_webp(bytes);
    }
    Err(SniffError::UnknownFormat)
}

fn sniff_png(bytes: &[u8]) -> Result<ImageInfo, SniffError> {
    // IHDR is always the first chunk: length(4) type(4) width(4) height(4)
    if bytes.len() < 24 || &bytes[12..16] != b"IHDR" {
        return Err(SniffError::Truncated(ImageFormat::Png));
    }
    Ok(ImageInfo {
        format: ImageFormat::Png,
        width: be_u32(&bytes[16..20]),
        height: be_u32(&bytes[20..24]),
    })
}

fn sniff_jpeg(bytes: &[u8]) -> Result<ImageInfo, SniffError> {
    let truncated = SniffError::Truncated(ImageFormat::Jpeg);
    let mut i = 2;

    while i < bytes.len() {
        if bytes[i] != 0xFF {
            return Err(truncated);
        }
        while i < bytes.len() && bytes[i] == 0xFF {
            i += 1;
        }
        let Some(&marker) = bytes.get(i) else {
            break;
        };
        i += 1;

        // Standalone markers carry no length
        if marker == 0x01 || (0xD0..=0xD9).contains(&marker) {
            continue;
        }

        let segment = bytes.get(i..i + 2).ok_or(truncated.clone())?;
        let length = usize::from(be_u16(segment));

        let is_start_of_frame =
            (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_start_of_frame {
            // length(2) precision(1) height(2) width(2)
            let frame = bytes.get(i + 3..i + 7).ok_or(truncated.clone())?;
            return Ok(ImageInfo {
                format: ImageFormat::Jpeg,
                width: u32::from(be_u16(&frame[2..4])),
                height: u32::from(be_u16(&frame[0..2])),
            });
        }

        if length < 2 {
            return Err(truncated);
        }
        i += length;
    }

    Err(truncated)
}

fn sniff_webp(bytes: &[u8]) -> Result<ImageInfo, SniffError> {
    let truncated = SniffError::Truncated(ImageFormat::Webp);
    let chunk = bytes.get(12..16).ok_or(truncated.clone())?;

    let (width, height) = match chunk {
        b"VP8 " => {
            let frame = bytes.get(23..30).ok_or(truncated.clone())?;
            if frame[0..3] != [0x9D, 0x01, 0x2A] {
                return Err(truncated);
            }
            (
                u32::from(le_u16(&frame[3..5]) & 0x3FFF),
                u32::from(le_u16(&frame[5..7]) & 0x3FFF),
            )
        }
        b"VP8L" => {
            let header = bytes.get(20..25).ok_or(truncated.clone())?;
            if header[0] != 0x2F {
                return Err(truncated);
            }
            let bits = le_u32(&header[1..5]);
            ((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1)
        }
        b"VP8X" => {
            let canvas = bytes.get(24..30).ok_or(truncated.clone())?;
            (le_u24(&canvas[0..3]) + 1, le_u24(&canvas[3..6]) + 1)
        }
        _ => return Err(truncated),
    };

    Ok(ImageInfo {
        format: ImageFormat::Webp,
        width,
        height,
    })
}

fn be_u16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u24(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], 0])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

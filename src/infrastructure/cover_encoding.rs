use image::DynamicImage;
use image::imageops::FilterType;
use thiserror::Error;

use crate::domain::image_sniff::{ImageFormat, ImageInfo, SniffError, sniff_image};
use crate::domain::processed_covers::{
    MAX_COVER_BYTES, OVERSIZE_MAX_DIMENSION, OVERSIZE_WEBP_QUALITY, WEBP_QUALITY, fit_within,
};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Sniff(#[from] SniffError),
    #[error("failed to decode image: {0}")]
    Decode(String),
}

pub struct EncodedCover {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Convert a downloaded cover to WebP, shrinking it if it would exceed the size cap.
///
/// Covers that are already WebP and under the cap are passed through untouched.
pub fn normalize_cover(bytes: &[u8]) -> Result<EncodedCover, EncodeError> {
    normalize_cover_with_limit(bytes, MAX_COVER_BYTES)
}

pub fn normalize_cover_with_limit(
    bytes: &[u8],
    max_bytes: usize,
) -> Result<EncodedCover, EncodeError> {
    let info = sniff_image(bytes)?;

    if info.format == ImageFormat::Webp && bytes.len() <= max_bytes {
        return Ok(passthrough(bytes, info));
    }

    let image = image::load_from_memory(bytes).map_err(|e| EncodeError::Decode(e.to_string()))?;

    let encoded = encode_webp(&image, WEBP_QUALITY);
    if encoded.data.len() <= max_bytes {
        return Ok(encoded);
    }

    let (width, height) = fit_within(image.width(), image.height(), OVERSIZE_MAX_DIMENSION);
    let resized = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };
    Ok(encode_webp(&resized, OVERSIZE_WEBP_QUALITY))
}

fn passthrough(bytes: &[u8], info: ImageInfo) -> EncodedCover {
    EncodedCover {
        data: bytes.to_vec(),
        format: info.format,
        width: info.width,
        height: info.height,
    }
}

fn encode_webp(image: &DynamicImage, quality: f32) -> EncodedCover {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let encoded = webp::Encoder::from_rgba(&rgba, width, height).encode(quality);

    EncodedCover {
        data: encoded.to_vec(),
        format: ImageFormat::Webp,
        width,
        height,
    }
}

use serde::{Deserialize, Serialize};

use super::image_sniff::ImageFormat;

pub const MAX_COVER_BYTES: usize = 2 * 1024 * 1024;
pub const WEBP_QUALITY: f32 = 85.0;
pub const OVERSIZE_WEBP_QUALITY: f32 = 70.0;
pub const OVERSIZE_MAX_DIMENSION: u32 = 1200;

/// A cover that has been normalised and stored; mirrors a `book_covers` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedCover {
    pub book_id: String,
    pub storage_path: String,
    pub public_url: String,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub original_url: String,
}

/// Shrink `(width, height)` so the longest side is at most `max`, keeping the aspect ratio.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max || longest == 0 {
        return (width, height);
    }
    let scale = f64::from(max) / f64::from(longest);
    let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

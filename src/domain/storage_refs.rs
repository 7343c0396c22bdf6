use url::Url;

use super::errors::ResolveError;

pub const VIDEO_MOMENTS_BUCKET: &str = "video-moments";
pub const BOOK_COVERS_BUCKET: &str = "book-covers";
pub const USER_COVERS_BUCKET: &str = "user-covers";

pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 3600;

const PUBLIC_OBJECT_PREFIX: &str = "/storage/v1/object/public/";
const SIGNED_OBJECT_PREFIX: &str = "/storage/v1/object/sign/";

/// Map a stored media reference to the bare object path inside `bucket`.
///
/// Bare paths (anything not starting with `http`) are returned as-is. Full URLs
/// issued by the storage platform are recognised by their public or signed
/// object prefix, and failing that by the first `/<bucket>/` segment in the
/// URL path. Anything else is an error, never a panic.
pub fn resolve_path(reference: &str, bucket: &str) -> Result<String, ResolveError> {
    if !reference.starts_with("http") {
        return Ok(reference.to_string());
    }

    let url = Url::parse(reference).map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;
    let path = url.path();

    let suffix = [PUBLIC_OBJECT_PREFIX, SIGNED_OBJECT_PREFIX]
        .iter()
        .find_map(|prefix| path.strip_prefix(&format!("{prefix}{bucket}/")))
        .or_else(|| {
            let marker = format!("/{bucket}/");
            path.find(&marker).map(|idx| &path[idx + marker.len()..])
        })
        .ok_or_else(|| ResolveError::UnrecognizedUrl {
            url: reference.to_string(),
            bucket: bucket.to_string(),
        })?;

    if suffix.is_empty() {
        return Err(ResolveError::EmptyPath);
    }

    urlencoding::decode(suffix)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ResolveError::InvalidUrl(e.to_string()))
}

/// Object key for a moment video recorded at `timestamp_ms`.
pub fn moment_video_path(child_id: &str, timestamp_ms: i64) -> String {
    format!("{child_id}/{timestamp_ms}.mp4")
}

pub fn moment_thumbnail_path(child_id: &str, timestamp_ms: i64) -> String {
    format!("{child_id}/{timestamp_ms}_thumb.jpg")
}

pub fn cover_object_path(book_id: &str, extension: &str) -> String {
    format!("covers/{book_id}.{extension}")
}

pub mod blank_images;
pub mod clock;
pub mod covers;
pub mod errors;
pub mod fallback;
pub mod image_sniff;
pub mod moments;
pub mod processed_covers;
pub mod quota;
pub mod repositories;
pub mod storage_refs;
pub mod ttl_cache;
pub mod video_trim;

// Re-exports
pub use errors::{ResolveError, SearchError, StorageError};

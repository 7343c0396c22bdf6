pub mod cover_pipeline;
pub mod cover_processing;
pub mod media_urls;

pub use cover_pipeline::CoverPipeline;
pub use cover_processing::{CoverProcessingError, CoverProcessor};
pub use media_urls::MediaUrlService;

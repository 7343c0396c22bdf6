pub mod client;
pub mod cover_encoding;
pub mod cover_search;
pub mod ffmpeg_trim;
pub mod google_books;
pub mod google_images;
pub mod image_validation;
pub mod open_library;
pub mod rest;
pub mod storage;

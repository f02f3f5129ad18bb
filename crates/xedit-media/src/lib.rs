//! Image preprocessing for uploaded portraits.
//!
//! Uploads are checked against an extension allow-list and downscaled so that
//! neither side exceeds 1024 pixels before they are handed to the prediction
//! service.

pub mod error;
pub mod preprocess;

pub use error::{MediaError, MediaResult};
pub use preprocess::{check_extension, target_size, ImagePreprocessor, ALLOWED_EXTENSIONS, MAX_DIMENSION};

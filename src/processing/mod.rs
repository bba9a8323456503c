//! Optional page processing: handwriting recognition and image re-encoding

mod ocr;
mod transcode;

use thiserror::Error;

use crate::config::ImageQuality;

pub use ocr::{CommandTextExtractor, DEFAULT_OCR_COMMAND};
pub use transcode::JpegTranscoder;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Text recognizer not available: {0}")]
    ExtractorNotFound(String),
    #[error("Text recognition failed: {0}")]
    Recognition(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Recognizes handwritten text on a page image
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, image: &[u8]) -> Result<String, ProcessingError>;
}

/// Re-encodes a page image
pub trait ImageTranscoder: Send + Sync {
    fn transcode(&self, image: &[u8], quality: ImageQuality) -> Result<Vec<u8>, ProcessingError>;
}

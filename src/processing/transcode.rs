use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;

use crate::config::ImageQuality;

use super::{ImageTranscoder, ProcessingError};

/// Re-encodes page images as JPEG at the quality's level
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegTranscoder;

impl ImageTranscoder for JpegTranscoder {
    fn transcode(&self, image: &[u8], quality: ImageQuality) -> Result<Vec<u8>, ProcessingError> {
        let decoded = image::load_from_memory(image)?;
        // JPEG has no alpha channel
        let rgb = decoded.to_rgb8();

        let mut out = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.jpeg_quality());
        encoder.encode_image(&rgb)?;

        log::debug!(
            "Transcoded page: {} -> {} bytes (quality {})",
            image.len(),
            out.get_ref().len(),
            quality.jpeg_quality()
        );
        Ok(out.into_inner())
    }
}

//! Canonical notebook content
//!
//! Interprets a decoded page bundle as notebook metadata plus an ordered list
//! of page images.

mod extractor;
mod models;

pub use extractor::{extract, ExtractError, METADATA_CANDIDATES, UNTITLED_NOTEBOOK};
pub use models::{sniff_image_mime, MetadataSource, NotebookContent, NotebookMetadata, PageImage};

/// PNG signature followed by a marker byte, enough to pass image sniffing.
#[cfg(test)]
pub(crate) fn fake_png(marker: u8) -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, marker]
}

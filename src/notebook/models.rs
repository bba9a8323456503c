use serde::{Deserialize, Deserializer, Serialize};

use super::extractor::UNTITLED_NOTEBOOK;

/// Epoch values above this are treated as milliseconds
const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Notebook metadata, as sent by the open handshake or stored in the
/// bundle's `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookMetadata {
    #[serde(default = "default_title", deserialize_with = "deserialize_title")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_pages: u32,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub current_page: u32,
    /// Last modification, seconds since the Unix epoch
    #[serde(
        rename = "modificationTime",
        default,
        deserialize_with = "deserialize_epoch_seconds"
    )]
    pub modification_time: i64,
}

impl Default for NotebookMetadata {
    fn default() -> Self {
        Self {
            title: default_title(),
            total_pages: 0,
            current_page: 0,
            modification_time: 0,
        }
    }
}

fn default_title() -> String {
    UNTITLED_NOTEBOOK.to_string()
}

fn deserialize_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let title = Option::<String>::deserialize(deserializer)?;
    Ok(title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(default_title))
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if value.is_finite() && value > 0.0 {
        Ok(value.min(u32::MAX as f64) as u32)
    } else {
        Ok(0)
    }
}

fn deserialize_epoch_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if !value.is_finite() {
        return Ok(0);
    }
    let seconds = if value.abs() >= MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    };
    Ok(seconds.trunc() as i64)
}

/// Where the metadata of a [`NotebookContent`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// Parsed from this archive entry
    Archive(String),
    /// Built from the page images because no metadata entry was usable
    Synthesized,
    /// Returned by the service when the notebook was opened
    Remote,
}

/// One rendered page
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    /// 1-based page number
    pub number: u32,
    /// Archive entry the image was read from
    pub entry_path: String,
    pub bytes: Vec<u8>,
    /// Handwriting recognized on this page, if recognition ran
    pub recognized_text: Option<String>,
}

impl PageImage {
    pub fn mime_type(&self) -> &'static str {
        sniff_image_mime(&self.bytes).unwrap_or("image/png")
    }
}

/// Notebook metadata plus its pages in display order
#[derive(Debug, Clone, PartialEq)]
pub struct NotebookContent {
    pub metadata: NotebookMetadata,
    pub metadata_source: MetadataSource,
    pub pages: Vec<PageImage>,
    /// Non-fatal problems found while extracting
    pub warnings: Vec<String>,
}

/// Detect the image MIME type from magic bytes
pub fn sniff_image_mime(data: &[u8]) -> Option<&'static str> {
    match data {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_from_open_response() {
        let json = r#"{"currentPage":3,"modificationTime":1717000000,"title":"Lecture notes","totalPages":12}"#;
        let metadata: NotebookMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.title, "Lecture notes");
        assert_eq!(metadata.total_pages, 12);
        assert_eq!(metadata.current_page, 3);
        assert_eq!(metadata.modification_time, 1717000000);
    }

    #[test]
    fn test_metadata_tolerates_floats_millis_and_gaps() {
        let json = r#"{"modificationTime":1717000000123.0,"title":null,"totalPages":4.0}"#;
        let metadata: NotebookMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.title, UNTITLED_NOTEBOOK);
        assert_eq!(metadata.total_pages, 4);
        assert_eq!(metadata.current_page, 0);
        assert_eq!(metadata.modification_time, 1717000000);
    }

    #[test]
    fn test_sniff_image_mime() {
        assert_eq!(
            sniff_image_mime(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("image/png")
        );
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"<html>"), None);
        assert_eq!(sniff_image_mime(&[]), None);
    }
}

use std::path::Path;

use chrono::Utc;
use thiserror::Error;

use crate::archive::ArchiveEntryMap;

use super::models::{sniff_image_mime, MetadataSource, NotebookContent, NotebookMetadata, PageImage};

/// Metadata locations inside a page bundle, highest priority first
pub const METADATA_CANDIDATES: [&str; 3] =
    ["metadata.json", "image/metadata.json", "data/metadata.json"];

/// Title used when the bundle carries no metadata
pub const UNTITLED_NOTEBOOK: &str = "Untitled Notebook";

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No metadata.json or page images found in archive ({entries} entries)")]
    MissingContent { entries: usize },
}

fn normalize_entry_path(path: &str) -> &str {
    path.trim_start_matches("./")
}

fn is_image_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Find the first metadata candidate that parses.
fn find_metadata(
    entries: &ArchiveEntryMap,
    warnings: &mut Vec<String>,
) -> Option<(NotebookMetadata, String)> {
    for candidate in METADATA_CANDIDATES {
        let found = entries
            .iter()
            .find(|(path, _)| normalize_entry_path(path) == candidate);

        let Some((path, bytes)) = found else {
            continue;
        };

        match serde_json::from_slice::<NotebookMetadata>(bytes) {
            Ok(metadata) => {
                log::debug!("extract: metadata found at '{}'", path);
                return Some((metadata, path.clone()));
            }
            Err(e) => {
                let warning = format!("Ignored unreadable metadata '{}': {}", path, e);
                log::warn!("extract: {}", warning);
                warnings.push(warning);
            }
        }
    }

    None
}

fn synthesize_metadata(page_count: usize) -> NotebookMetadata {
    NotebookMetadata {
        title: UNTITLED_NOTEBOOK.to_string(),
        total_pages: page_count as u32,
        current_page: 1,
        modification_time: Utc::now().timestamp(),
    }
}

/// Interpret a decoded bundle as notebook content.
///
/// Pages are ordered by plain string sort of their file names (so
/// `page_10.png` sorts before `page_2.png`) and numbered from 1 in that
/// order. Page images whose bytes are not a PNG or JPEG are skipped with a
/// warning.
pub fn extract(entries: &ArchiveEntryMap) -> Result<NotebookContent, ExtractError> {
    let mut warnings = Vec::new();
    let metadata = find_metadata(entries, &mut warnings);

    let mut image_paths: Vec<&String> = entries.keys().filter(|p| is_image_path(p)).collect();

    if metadata.is_none() && image_paths.is_empty() {
        return Err(ExtractError::MissingContent {
            entries: entries.len(),
        });
    }

    image_paths.sort_by(|a, b| file_name(a).cmp(file_name(b)).then_with(|| a.cmp(b)));

    let mut pages = Vec::with_capacity(image_paths.len());
    for path in &image_paths {
        let bytes = &entries[*path];
        if sniff_image_mime(bytes).is_none() {
            let warning = format!(
                "Skipped unreadable page image '{}' ({} bytes)",
                path,
                bytes.len()
            );
            log::warn!("extract: {}", warning);
            warnings.push(warning);
            continue;
        }

        pages.push(PageImage {
            number: pages.len() as u32 + 1,
            entry_path: (*path).clone(),
            bytes: bytes.clone(),
            recognized_text: None,
        });
    }

    let (metadata, metadata_source) = match metadata {
        Some((metadata, path)) => (metadata, MetadataSource::Archive(path)),
        None => {
            log::info!(
                "extract: no metadata in archive, synthesizing from {} page image(s)",
                image_paths.len()
            );
            (synthesize_metadata(image_paths.len()), MetadataSource::Synthesized)
        }
    };

    if pages.len() != metadata.total_pages as usize {
        log::debug!(
            "extract: metadata declares {} page(s), archive provided {}",
            metadata.total_pages,
            pages.len()
        );
    }

    Ok(NotebookContent {
        metadata,
        metadata_source,
        pages,
        warnings,
    })
}

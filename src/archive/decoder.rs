use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use tar::EntryType;
use thiserror::Error;

/// Entry path -> raw entry bytes, ordered by path
pub type ArchiveEntryMap = BTreeMap<String, Vec<u8>>;

/// ustar magic, checked at [`TAR_MAGIC_OFFSET`]
pub const TAR_MAGIC: &[u8; 5] = b"ustar";

/// Byte offset of the magic inside the first header block
pub const TAR_MAGIC_OFFSET: usize = 257;

const BLOCK_SIZE: usize = 512;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Not a tar archive: {0}")]
    Format(String),
    #[error("Corrupt archive entry '{path}': {message}")]
    Corruption { path: String, message: String },
}

impl ArchiveError {
    fn corruption(path: &str, message: impl ToString) -> Self {
        ArchiveError::Corruption {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

/// Check for the ustar magic at offset 257
pub fn has_archive_magic(data: &[u8]) -> bool {
    data.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()) == Some(&TAR_MAGIC[..])
}

/// An archive with no entries is nothing but zero-filled end-of-archive
/// blocks and padding.
fn is_empty_archive(data: &[u8]) -> bool {
    data.len() >= BLOCK_SIZE && data.iter().all(|b| *b == 0)
}

/// Whether an entry of this type carries file bytes we should keep.
///
/// Unrecognized type flags are kept: the render service has been seen using
/// non-standard flags for plain image entries.
fn carries_file_data(kind: EntryType, size: u64) -> bool {
    match kind {
        EntryType::Regular | EntryType::Continuous => true,
        EntryType::Directory
        | EntryType::Symlink
        | EntryType::Link
        | EntryType::Char
        | EntryType::Block
        | EntryType::Fifo
        | EntryType::GNULongName
        | EntryType::GNULongLink
        | EntryType::GNUSparse
        | EntryType::XGlobalHeader
        | EntryType::XHeader => false,
        _ => size > 0,
    }
}

/// Decode a ustar archive held in memory into an entry map.
///
/// Fails with [`ArchiveError::Format`] before reading any entry when the
/// buffer is not a ustar archive, so callers never see a partial map.
pub fn decode(data: &[u8]) -> Result<ArchiveEntryMap, ArchiveError> {
    if data.len() < BLOCK_SIZE {
        return Err(ArchiveError::Format(format!(
            "buffer too short ({} bytes)",
            data.len()
        )));
    }

    if is_empty_archive(data) {
        log::debug!("decode: archive holds no entries");
        return Ok(ArchiveEntryMap::new());
    }

    if !has_archive_magic(data) {
        let preview: String = data
            .iter()
            .take(16)
            .map(|b| format!("{:02x}", b))
            .collect();
        return Err(ArchiveError::Format(format!(
            "missing ustar magic at offset {} (first bytes: {})",
            TAR_MAGIC_OFFSET, preview
        )));
    }

    let mut archive = tar::Archive::new(Cursor::new(data));
    let mut entries = ArchiveEntryMap::new();

    let iter = archive
        .entries()
        .map_err(|e| ArchiveError::corruption("<archive>", e))?;

    for entry_result in iter {
        let mut entry = entry_result.map_err(|e| ArchiveError::corruption("<header>", e))?;

        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let kind = entry.header().entry_type();
        let declared = entry.size();

        if !carries_file_data(kind, declared) || path.is_empty() || path.ends_with('/') {
            log::debug!("decode: skipping entry '{}' ({:?})", path, kind);
            continue;
        }

        let capacity = declared.min(data.len() as u64) as usize;
        let mut bytes = Vec::with_capacity(capacity);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::corruption(&path, e))?;

        if bytes.len() as u64 != declared {
            return Err(ArchiveError::corruption(
                &path,
                format!("declared {} bytes but only {} remain", declared, bytes.len()),
            ));
        }

        log::debug!("decode: entry '{}' ({} bytes)", path, bytes.len());
        entries.insert(path, bytes);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::build_archive;

    #[test]
    fn test_decode_regular_entries() {
        let data = build_archive(&[
            ("metadata.json", br#"{"title":"Ideas"}"#),
            ("image/page_1.png", b"png-bytes"),
        ]);

        let entries = decode(&data).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries["metadata.json"], br#"{"title":"Ideas"}"#.to_vec());
        assert_eq!(entries["image/page_1.png"], b"png-bytes".to_vec());
    }

    #[test]
    fn test_decode_rejects_html_error_page() {
        let mut data = b"<!DOCTYPE html><html><body>Service error</body></html>".to_vec();
        data.resize(2048, b' ');

        let err = decode(&data).unwrap_err();
        assert!(matches!(err, ArchiveError::Format(_)));
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        assert!(matches!(decode(b"ustar").unwrap_err(), ArchiveError::Format(_)));
        assert!(matches!(decode(&[]).unwrap_err(), ArchiveError::Format(_)));
    }

    #[test]
    fn test_decode_rejects_magic_at_wrong_offset() {
        let mut data = build_archive(&[("a.png", b"x")]);
        data[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5].copy_from_slice(b"xxxxx");
        data[0..5].copy_from_slice(b"ustar");

        assert!(matches!(decode(&data).unwrap_err(), ArchiveError::Format(_)));
    }

    #[test]
    fn test_decode_empty_archive() {
        let data = tar::Builder::new(Vec::new()).into_inner().unwrap();
        let entries = decode(&data).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage_after_zero_block() {
        let mut data = vec![0u8; BLOCK_SIZE];
        data.extend_from_slice(&b"<html><body>Something went wrong</body></html>".repeat(20));
        assert!(matches!(decode(&data).unwrap_err(), ArchiveError::Format(_)));
    }

    #[test]
    fn test_decode_truncated_entry_is_corruption() {
        let page = vec![7u8; 2000];
        let mut data = build_archive(&[("page_1.png", &page)]);
        data.truncate(BLOCK_SIZE + 100);

        match decode(&data).unwrap_err() {
            ArchiveError::Corruption { path, .. } => assert_eq!(path, "page_1.png"),
            other => panic!("expected corruption, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_keeps_unknown_type_flag_and_skips_directories() {
        let mut builder = tar::Builder::new(Vec::new());

        let mut dir = tar::Header::new_ustar();
        dir.set_size(0);
        dir.set_mode(0o755);
        dir.set_entry_type(EntryType::Directory);
        builder.append_data(&mut dir, "image/", &[][..]).unwrap();

        let mut odd = tar::Header::new_ustar();
        odd.set_size(3);
        odd.set_mode(0o644);
        odd.set_entry_type(EntryType::new(b'Z'));
        builder.append_data(&mut odd, "image/page_1.png", &b"abc"[..]).unwrap();

        let data = builder.into_inner().unwrap();
        let entries = decode(&data).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries["image/page_1.png"], b"abc".to_vec());
    }

    #[test]
    fn test_has_archive_magic() {
        let data = build_archive(&[("a.png", b"x")]);
        assert!(has_archive_magic(&data));
        assert!(!has_archive_magic(b"<html></html>"));
    }
}

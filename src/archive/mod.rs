//! Rendered page bundle decoding
//!
//! The render endpoint answers with a ustar archive holding one image per
//! page and (sometimes) a `metadata.json`. This module turns those bytes into
//! an in-memory map of entry path to entry bytes.

mod decoder;

pub use decoder::{decode, has_archive_magic, ArchiveEntryMap, ArchiveError, TAR_MAGIC, TAR_MAGIC_OFFSET};

/// Build an in-memory ustar archive from `(path, bytes)` pairs.
#[cfg(test)]
pub(crate) fn build_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_ustar();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

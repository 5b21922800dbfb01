//! In-memory ZIP accumulator for encoded pages.
//!
//! Entries are written with `CompressionMethod::Stored` (PNG payloads are
//! already deflated). Every entry carries the DOS epoch as its timestamp, so
//! two runs over the same input produce byte-identical archives.

use crate::error::Pdf2ImgError;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Single-writer archive builder. Consumed by [`ArchiveBuilder::finish`].
pub struct ArchiveBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
            entries: 0,
        }
    }

    /// Append `bytes` under `name`. Names must be unique.
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), Pdf2ImgError> {
        self.zip.start_file(name, self.options)?;
        self.zip
            .write_all(bytes)
            .map_err(|e| Pdf2ImgError::ArchiveFailed(format!("{name}: {e}")))?;
        self.entries += 1;
        debug!("Archived {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Write the central directory and return the packed archive.
    pub fn finish(self) -> Result<Vec<u8>, Pdf2ImgError> {
        Ok(self.zip.finish()?.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn empty_archive_is_valid() {
        let builder = ArchiveBuilder::new();
        assert!(builder.is_empty());
        let bytes = builder.finish().unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn entries_keep_insertion_order_and_are_stored() {
        let mut builder = ArchiveBuilder::new();
        builder.add("doc_page_1.png", b"one").unwrap();
        builder.add("doc_page_2.png", b"two").unwrap();
        assert_eq!(builder.len(), 2);

        let mut archive = ZipArchive::new(Cursor::new(builder.finish().unwrap())).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["doc_page_1.png", "doc_page_2.png"]);

        let mut entry = archive.by_name("doc_page_2.png").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
        let mut body = Vec::new();
        entry.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"two");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = ArchiveBuilder::new();
        builder.add("a.png", b"1").unwrap();
        let err = builder.add("a.png", b"2").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::ArchiveFailed(_)));
    }

    #[test]
    fn output_is_deterministic() {
        let build = || {
            let mut b = ArchiveBuilder::new();
            b.add("x_page_1.png", b"payload").unwrap();
            b.finish().unwrap()
        };
        assert_eq!(build(), build());
    }
}

//! Result types returned by the conversion entry points.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// Everything a successful conversion produces.
///
/// `archive` is deliberately not serialised: it is the ZIP itself and is
/// written to disk (or handed to the caller) as raw bytes.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The packed ZIP, one `<base>_page_<N>.png` entry per archived page.
    #[serde(skip)]
    pub archive: Vec<u8>,
    /// One preview per archived page, ascending by page number.
    pub previews: Vec<PagePreview>,
    /// `<base>_images.zip`
    pub output_name: String,
    /// Pages left out of the archive under the skip policy.
    pub skipped: Vec<PageError>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Archive entry names in the order they were written.
    pub fn entry_names(&self) -> Vec<String> {
        let base = crate::naming::archive_base(&self.output_name);
        self.previews
            .iter()
            .map(|p| crate::naming::page_entry_name(base, p.page_num))
            .collect()
    }
}

/// Low-resolution snapshot of one archived page, for inline display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePreview {
    /// 1-indexed page number.
    pub page_num: usize,
    pub width: u32,
    pub height: u32,
    /// `data:image/png;base64,…`
    pub data_url: String,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub archived_pages: usize,
    pub skipped_pages: usize,
    pub archive_bytes: u64,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
    pub encode_duration_ms: u64,
}

/// Information-dictionary metadata plus page count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

//! Archive and entry naming.
//!
//! Everything is derived from the input's base name (file name minus its
//! last extension):
//!
//! ```text
//! report.pdf ─▶ report ─┬─▶ report_page_1.png, report_page_2.png, …
//!                       └─▶ report_images.zip
//! ```
//!
//! Page numbers are 1-indexed and not zero-padded.

use once_cell::sync::Lazy;
use regex::Regex;

/// Only the final `.ext` is removed, and only if it is not part of a
/// directory component.
static EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[^/.]+$").unwrap());

/// Suffix appended to the base name to form the archive name.
pub const ARCHIVE_SUFFIX: &str = "_images.zip";

/// Strip the last extension from `file_name`.
///
/// A leading directory path is dropped first so a URL-derived or absolute
/// name never leaks separators into entry names.
pub fn base_name(file_name: &str) -> String {
    let leaf = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    EXTENSION.replace(leaf, "").into_owned()
}

/// `<base>_page_<N>.png`
pub fn page_entry_name(base: &str, page_num: usize) -> String {
    format!("{base}_page_{page_num}.png")
}

/// `<base>_images.zip`
pub fn output_name(base: &str) -> String {
    format!("{base}{ARCHIVE_SUFFIX}")
}

/// Inverse of [`output_name`]: the base an archive name was built from.
/// Names without the archive suffix are returned unchanged.
pub fn archive_base(output_name: &str) -> &str {
    output_name
        .strip_suffix(ARCHIVE_SUFFIX)
        .unwrap_or(output_name)
}

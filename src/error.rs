//! Error types for the edgequake-pdf2img library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2ImgError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad input, undecodable PDF, render failure, cancellation). Returned as
//!   `Err(Pdf2ImgError)` from the top-level `convert*` functions; no partial
//!   archive is ever handed back alongside it.
//!
//! * [`PageError`] — **Non-fatal**: a single page produced no image data and
//!   was left out of the archive under [`crate::PageErrorPolicy::Skip`]. These
//!   are collected in [`crate::output::ConversionOutput::skipped`] so a page
//!   never disappears without a trace.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A page produced no image data and the policy is `abort`.
    #[error("Image encoding failed for page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The ZIP writer rejected an entry or could not be finalised.
    #[error("Failed to build archive: {0}")]
    ArchiveFailed(String),

    /// Could not create or write the output archive file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller's cancel token fired between two pages.
    #[error("Conversion cancelled after {completed}/{total} pages")]
    Cancelled { completed: usize, total: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Point --pdfium-base-url at a reachable mirror of pdfium-binaries.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<pdfium_auto::PdfiumAutoError> for Pdf2ImgError {
    fn from(e: pdfium_auto::PdfiumAutoError) -> Self {
        Pdf2ImgError::PdfiumBindingFailed(e.to_string())
    }
}

impl From<zip::result::ZipError> for Pdf2ImgError {
    fn from(e: zip::result::ZipError) -> Self {
        Pdf2ImgError::ArchiveFailed(e.to_string())
    }
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The rendered surface could not be turned into PNG bytes.
    #[error("Page {page}: image encoding produced no data: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::EncodeFailed { page, .. } => *page,
        }
    }
}

impl From<PageError> for Pdf2ImgError {
    fn from(e: PageError) -> Self {
        match e {
            PageError::EncodeFailed { page, detail } => Pdf2ImgError::EncodeFailed { page, detail },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_display() {
        let e = Pdf2ImgError::Cancelled {
            completed: 4,
            total: 10,
        };
        assert!(e.to_string().contains("4/10"), "got: {e}");
    }

    #[test]
    fn rasterisation_display_names_page() {
        let e = Pdf2ImgError::RasterisationFailed {
            page: 7,
            detail: "bitmap alloc".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 7"));
        assert!(msg.contains("bitmap alloc"));
    }

    #[test]
    fn page_error_promotes_to_fatal() {
        let page_err = PageError::EncodeFailed {
            page: 3,
            detail: "empty surface".into(),
        };
        assert_eq!(page_err.page(), 3);
        let fatal: Pdf2ImgError = page_err.into();
        assert!(matches!(fatal, Pdf2ImgError::EncodeFailed { page: 3, .. }));
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::EncodeFailed {
            page: 2,
            detail: "x".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("EncodeFailed"));
        let back: PageError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn binding_error_mentions_env_override() {
        let e = Pdf2ImgError::PdfiumBindingFailed("dlopen failed".into());
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
    }
}

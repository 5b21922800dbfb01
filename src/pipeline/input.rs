//! Input resolution: turn a user-supplied path or URL into PDF bytes plus
//! the file name the outputs are named after.
//!
//! pdfium decodes straight from memory, so downloads never touch the disk.
//! The `%PDF` magic check runs before pdfium is even bound, so garbage input
//! fails fast with a readable error instead of an opaque decoder message.

use crate::error::Pdf2ImgError;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

/// A PDF held in memory together with its original file name.
#[derive(Debug, Clone)]
pub struct InputDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reject anything that does not start with `%PDF`.
pub fn check_pdf_magic(bytes: &[u8], name: &str) -> Result<(), Pdf2ImgError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(Pdf2ImgError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Resolve the input string to an in-memory PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<InputDocument, Pdf2ImgError> {
    if input.trim().is_empty() {
        return Err(Pdf2ImgError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        let path = PathBuf::from(input);
        tokio::task::spawn_blocking(move || read_local(path))
            .await
            .map_err(|e| Pdf2ImgError::Internal(format!("Read task panicked: {}", e)))?
    }
}

/// Read a local file, validating existence, permissions and PDF magic bytes.
fn read_local(path: PathBuf) -> Result<InputDocument, Pdf2ImgError> {
    if !path.exists() {
        return Err(Pdf2ImgError::FileNotFound { path });
    }

    let mut bytes = Vec::new();
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            f.read_to_end(&mut bytes)
                .map_err(|e| Pdf2ImgError::Internal(format!("Failed to read {:?}: {}", path, e)))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2ImgError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2ImgError::FileNotFound { path }),
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    check_pdf_magic(&bytes, &file_name)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(InputDocument { bytes, file_name })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<InputDocument, Pdf2ImgError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2ImgError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let download_err = |e: reqwest::Error| {
        if e.is_timeout() {
            Pdf2ImgError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2ImgError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(download_err)?;

    if !response.status().is_success() {
        return Err(Pdf2ImgError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(download_err)?.to_vec();
    let file_name = filename_from_url(url);
    check_pdf_magic(&bytes, &file_name)?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), file_name);
    Ok(InputDocument { bytes, file_name })
}

/// Last non-empty path segment containing a dot, else `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://example.com/a/report.pdf"), "report.pdf");
        assert_eq!(filename_from_url("https://arxiv.org/pdf/1706.03762"), "1706.03762");
        assert_eq!(filename_from_url("https://example.com/download"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
    }

    #[test]
    fn magic_check() {
        assert!(check_pdf_magic(b"%PDF-1.7\n", "a.pdf").is_ok());
        let err = check_pdf_magic(b"PK\x03\x04", "a.zip").unwrap_err();
        match err {
            Pdf2ImgError::NotAPdf { name, magic } => {
                assert_eq!(name, "a.zip");
                assert_eq!(magic, b"PK\x03\x04");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(check_pdf_magic(b"", "empty.pdf").is_err());
    }

    #[tokio::test]
    async fn local_file_is_read_with_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4 fake")
            .unwrap();

        let doc = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.file_name, "slides.pdf");
        assert_eq!(doc.bytes, b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn missing_and_non_pdf_files_fail() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, Pdf2ImgError::FileNotFound { .. }));

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();
        let err = resolve_input(tmp.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::NotAPdf { .. }));

        let err = resolve_input("   ", 5).await.unwrap_err();
        assert!(matches!(err, Pdf2ImgError::InvalidInput { .. }));
    }
}

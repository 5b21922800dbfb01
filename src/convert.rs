//! Conversion entry points.
//!
//! All of them funnel into [`convert_from_bytes`], which binds pdfium,
//! decodes the document and runs [`crate::pipeline::orchestrate::run`] on a
//! `spawn_blocking` thread. The async wrappers never hold pdfium state.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImgError;
use crate::naming;
use crate::output::{ConversionOutput, DocumentMetadata};
use crate::pipeline::render::{self, PageRasterizer, PdfiumRasterizer};
use crate::pipeline::{input, orchestrate};
use std::path::{Path, PathBuf};
use tracing::info;

/// Convert a PDF file or URL into a ZIP of page images.
///
/// # Arguments
/// * `input` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Errors
/// Any input, decode, render or archive failure. There are no partial
/// results: on `Err` nothing was produced.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let doc = input::resolve_input(input_str, config.download_timeout_secs).await?;
    convert_from_bytes(doc.bytes, &doc.file_name, config).await
}

/// Convert PDF bytes held in memory.
///
/// `file_name` is the document's original name; it drives the archive
/// name (`<base>_images.zip`) and every entry name (`<base>_page_<N>.png`).
/// Progress is reported through `config.progress_callback`.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2img::{convert_from_bytes, progress, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("report.pdf")?;
/// let config = ConversionConfig::builder()
///     .progress_callback(progress::percent_fn(|p| eprintln!("{p}%")))
///     .build()?;
/// let output = convert_from_bytes(bytes, "report.pdf", &config).await?;
/// std::fs::write(&output.output_name, &output.archive)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: Vec<u8>,
    file_name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    input::check_pdf_magic(&bytes, file_name)?;

    let name = file_name.to_string();
    let base = naming::base_name(file_name);
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = render::bind_engine(&config.engine)?;
        let doc = PdfiumRasterizer::open(&pdfium, bytes, config.password.as_deref(), &name)?;
        orchestrate::run(&doc, &base, &config)
    })
    .await
    .map_err(|e| Pdf2ImgError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Convert a PDF and write the archive to disk.
///
/// With `output_path = None` the archive is written to
/// `<base>_images.zip` in the current directory. Uses atomic write
/// (temp file + rename) so a failed run never leaves a truncated ZIP.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<(PathBuf, ConversionOutput), Pdf2ImgError> {
    let output = convert(input_str, config).await?;
    let path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&output.output_name));

    write_atomic(&path, &output.archive).await?;
    info!("Wrote {} ({} bytes)", path.display(), output.archive.len());
    Ok((path, output))
}

/// Extract PDF metadata without rendering any page.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, Pdf2ImgError> {
    let doc = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let engine = config.engine.clone();
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || -> Result<DocumentMetadata, Pdf2ImgError> {
        let pdfium = render::bind_engine(&engine)?;
        let pdf = PdfiumRasterizer::open(&pdfium, doc.bytes, password.as_deref(), &doc.file_name)?;
        Ok(pdf.metadata())
    })
    .await
    .map_err(|e| Pdf2ImgError::Internal(format!("Metadata task panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2ImgError> {
    let write_err = |source| Pdf2ImgError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("zip.tmp");
    let written = match tokio::fs::write(&tmp_path, bytes).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

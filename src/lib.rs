//! # edgequake-pdf2img
//!
//! Rasterise every page of a PDF into a PNG and pack the pages into a single
//! ZIP archive, with a small inline preview of each page and percentage
//! progress along the way.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL, check %PDF magic
//!  ├─ 2. Decode   open with pdfium (blocking, spawn_blocking)
//!  ├─ 3. Render   page N → RGBA surface at `scale` × native size
//!  ├─ 4. Encode   surface → PNG entry + down-sampled preview data URL
//!  ├─ 5. Archive  `<base>_page_<N>.png` appended in page order (stored)
//!  └─ 6. Output   `<base>_images.zip` bytes + previews + stats
//! ```
//!
//! Pages are processed strictly one at a time, so only one full-resolution
//! surface is alive at any moment and progress percentages never go back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("report.pdf", &config).await?;
//!     std::fs::write(&output.output_name, &output.archive)?;
//!     eprintln!("{} pages, {} previews",
//!         output.stats.archived_pages,
//!         output.previews.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2img = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDFium
//!
//! The rendering engine is located through an [`EngineConfig`]. By default
//! the library is downloaded once into the user cache directory; set
//! `library_path` to use an installed copy instead.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod convert;
pub mod error;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use config::{ConversionConfig, ConversionConfigBuilder, PageErrorPolicy};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_to_file, inspect};
pub use error::{PageError, Pdf2ImgError};
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PagePreview};
pub use pdfium_auto::EngineConfig;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};

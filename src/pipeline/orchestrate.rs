//! The per-page conversion loop.
//!
//! ```text
//! for page in 1..=N:
//!     cancelled? ──▶ abort
//!     viewport(page, scale) ──▶ render ──▶ encode PNG ──┬─▶ archive entry
//!                                                       └─▶ preview data URL
//!     progress(page)
//!     drop surface
//! finish archive
//! ```
//!
//! Pages are handled one at a time, in order. Exactly one full-resolution
//! surface is alive at any moment: it is owned by the loop body and dropped
//! before the next page is rendered, so peak memory does not grow with the
//! page count.

use crate::config::{ConversionConfig, PageErrorPolicy};
use crate::error::{PageError, Pdf2ImgError};
use crate::naming;
use crate::output::{ConversionOutput, ConversionStats, PagePreview};
use crate::pipeline::archive::ArchiveBuilder;
use crate::pipeline::encode;
use crate::pipeline::render::{PageRasterizer, Viewport};
use crate::progress::progress_percent;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every page of `doc` into the archive, previews and stats.
///
/// `base` is the input name with its extension already stripped.
///
/// # Errors
/// Aborts on the first render failure, on cancellation, and on an encode
/// failure when the policy is [`PageErrorPolicy::Abort`]. Nothing produced
/// so far is returned in that case.
pub fn run(
    doc: &dyn PageRasterizer,
    base: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let total_start = Instant::now();
    let total_pages = doc.page_count();
    let metadata = doc.metadata();
    let callback = config.progress_callback.as_deref();

    info!("Converting {} pages at {}x", total_pages, config.scale);
    if let Some(cb) = callback {
        cb.on_conversion_start(total_pages);
    }

    let mut archive = ArchiveBuilder::new();
    let mut previews: Vec<PagePreview> = Vec::with_capacity(total_pages);
    let mut skipped: Vec<PageError> = Vec::new();
    let mut render_ms = 0u64;
    let mut encode_ms = 0u64;

    for index in 0..total_pages {
        let page_num = index + 1;

        if config.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
            info!("Cancelled before page {}", page_num);
            return Err(Pdf2ImgError::Cancelled {
                completed: index,
                total: total_pages,
            });
        }

        if let Some(cb) = callback {
            cb.on_page_start(page_num, total_pages);
        }

        let render_start = Instant::now();
        let viewport = Viewport::new(doc.page_size(index)?, config.scale);
        let surface = doc.render(index, &viewport)?;
        render_ms += render_start.elapsed().as_millis() as u64;

        let encode_start = Instant::now();
        match encode::encode_with_preview(&surface, page_num, config.preview_scale) {
            Ok((png, preview)) => {
                archive.add(&naming::page_entry_name(base, page_num), &png)?;
                previews.push(preview);
            }
            Err(detail) => {
                let page_err = PageError::EncodeFailed {
                    page: page_num,
                    detail,
                };
                if config.on_page_error == PageErrorPolicy::Abort {
                    return Err(page_err.into());
                }
                warn!("Skipping page {}: {}", page_num, page_err);
                if let Some(cb) = callback {
                    cb.on_page_skipped(page_num, total_pages, &page_err.to_string());
                }
                skipped.push(page_err);
            }
        }
        encode_ms += encode_start.elapsed().as_millis() as u64;

        if let Some(cb) = callback {
            cb.on_progress(page_num, total_pages, progress_percent(page_num, total_pages));
        }

        debug!(
            "Page {}/{} done; releasing {}x{} surface",
            page_num, total_pages, viewport.width_px, viewport.height_px
        );
        drop(surface);
    }

    let archived_pages = archive.len();
    let archive = archive.finish()?;

    let stats = ConversionStats {
        total_pages,
        archived_pages,
        skipped_pages: skipped.len(),
        archive_bytes: archive.len() as u64,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms: render_ms,
        encode_duration_ms: encode_ms,
    };

    info!(
        "Archive complete: {}/{} pages, {} bytes, {}ms",
        archived_pages, total_pages, stats.archive_bytes, stats.total_duration_ms
    );
    if let Some(cb) = callback {
        cb.on_conversion_complete(total_pages, archived_pages);
    }

    Ok(ConversionOutput {
        archive,
        previews,
        output_name: naming::output_name(base),
        skipped,
        metadata,
        stats,
    })
}

//! Image encoding: raster surface → PNG bytes, plus the preview data URL.
//!
//! PNG is lossless, so rendered text keeps its hard edges, and it is already
//! deflate-compressed, which is why the archive stores entries as-is.
//!
//! Previews are the same surface down-sampled by the preview factor and
//! PNG-encoded again. Shrinking the pixels is what saves memory here.
//! A "quality" knob would be meaningless for a lossless format.

use crate::output::PagePreview;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::error::{ParameterError, ParameterErrorKind};
use image::imageops::{self, FilterType};
use image::{ImageError, ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Encode a full-resolution page surface as PNG.
///
/// A zero-area surface has nothing to encode and is reported as an error so
/// the caller's page-error policy decides what happens to it.
pub fn encode_page(surface: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    if surface.width() == 0 || surface.height() == 0 {
        return Err(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        )));
    }

    let mut buf = Vec::new();
    surface.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} surface → {} bytes PNG",
        surface.width(),
        surface.height(),
        buf.len()
    );
    Ok(buf)
}

/// Dimensions of a preview of a `width × height` surface at `factor`,
/// never collapsing below one pixel per side.
pub fn preview_dimensions(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * factor as f64).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Down-sample `surface` by `factor` and wrap it as a PNG data URL.
pub fn encode_preview(
    surface: &RgbaImage,
    page_num: usize,
    factor: f32,
) -> Result<PagePreview, ImageError> {
    let (width, height) = preview_dimensions(surface.width(), surface.height(), factor);
    let small = imageops::resize(surface, width, height, FilterType::Triangle);
    let png = encode_page(&small)?;

    Ok(PagePreview {
        page_num,
        width,
        height,
        data_url: format!("data:image/png;base64,{}", STANDARD.encode(&png)),
    })
}

/// Both halves of one archived page: the PNG entry and its preview.
///
/// Either both are produced or neither is, so the archive and the preview
/// list never disagree. The error is a human-readable reason.
pub fn encode_with_preview(
    surface: &RgbaImage,
    page_num: usize,
    factor: f32,
) -> Result<(Vec<u8>, PagePreview), String> {
    let png = encode_page(surface).map_err(|e| e.to_string())?;
    if png.is_empty() {
        return Err("encoder returned no bytes".to_string());
    }
    let preview = encode_preview(surface, page_num, factor).map_err(|e| format!("preview: {e}"))?;
    Ok((png, preview))
}

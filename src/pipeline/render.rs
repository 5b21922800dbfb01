//! PDF decoding and rasterisation via pdfium.
//!
//! The orchestrator only sees the [`PageRasterizer`] trait: page count, page
//! geometry, and "render page N into a surface this big". [`PdfiumRasterizer`]
//! is the production implementation; tests drive the pipeline with a fake.
//!
//! pdfium holds thread-local state and must not be called from async tasks,
//! so everything here is blocking. `crate::convert` runs it inside
//! `tokio::task::spawn_blocking`.

use crate::error::Pdf2ImgError;
use crate::output::DocumentMetadata;
use image::RgbaImage;
use pdfium_auto::EngineConfig;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Native page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Pixel geometry of one page rendered at a given scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub width_px: u32,
    pub height_px: u32,
}

impl Viewport {
    /// Scale `size` by `scale`, truncating to whole pixels (at least one).
    pub fn new(size: PageSize, scale: f32) -> Self {
        let px = |pt: f32| ((pt * scale).floor() as u32).max(1);
        Self {
            scale,
            width_px: px(size.width_pt),
            height_px: px(size.height_pt),
        }
    }
}

/// A decoded document whose pages can be rendered one at a time.
pub trait PageRasterizer {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Native geometry of the page at 0-based `index`.
    fn page_size(&self, index: usize) -> Result<PageSize, Pdf2ImgError>;

    /// Render the page at 0-based `index` into a fresh surface of exactly
    /// `viewport.width_px × viewport.height_px`.
    fn render(&self, index: usize, viewport: &Viewport) -> Result<RgbaImage, Pdf2ImgError>;

    /// Information-dictionary metadata. Defaults to just the page count.
    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            page_count: self.page_count(),
            ..DocumentMetadata::default()
        }
    }
}

/// Bind to the PDFium library described by `engine`, downloading it on
/// first use.
pub fn bind_engine(engine: &EngineConfig) -> Result<Pdfium, Pdf2ImgError> {
    Ok(pdfium_auto::bind_pdfium(engine, None)?)
}

/// A PDF opened by pdfium.
pub struct PdfiumRasterizer<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumRasterizer<'a> {
    /// Decode `bytes`. `name` is only used in error messages.
    pub fn open(
        pdfium: &'a Pdfium,
        bytes: Vec<u8>,
        password: Option<&str>,
        name: &str,
    ) -> Result<Self, Pdf2ImgError> {
        let document = pdfium
            .load_pdf_from_byte_vec(bytes, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        Pdf2ImgError::WrongPassword {
                            name: name.to_string(),
                        }
                    } else {
                        Pdf2ImgError::PasswordRequired {
                            name: name.to_string(),
                        }
                    }
                } else {
                    Pdf2ImgError::CorruptPdf {
                        name: name.to_string(),
                        detail: err_str,
                    }
                }
            })?;

        info!("PDF loaded: {} pages", document.pages().len());
        Ok(Self { document })
    }

    fn page(&self, index: usize) -> Result<PdfPage<'a>, Pdf2ImgError> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| Pdf2ImgError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }
}

impl PageRasterizer for PdfiumRasterizer<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize, Pdf2ImgError> {
        let page = self.page(index)?;
        Ok(PageSize {
            width_pt: page.width().value,
            height_pt: page.height().value,
        })
    }

    fn render(&self, index: usize, viewport: &Viewport) -> Result<RgbaImage, Pdf2ImgError> {
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new()
            .set_target_width(viewport.width_px as i32)
            .set_target_height(viewport.height_px as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2ImgError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let surface = bitmap.as_image().into_rgba8();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            surface.width(),
            surface.height()
        );
        Ok(surface)
    }

    fn metadata(&self) -> DocumentMetadata {
        let metadata = self.document.metadata();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata
                .get(tag)
                .map(|t| t.value().to_string())
                .filter(|v| !v.is_empty())
        };

        DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: self.page_count(),
            pdf_version: format!("{:?}", self.document.version()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_scales_letter_page() {
        let vp = Viewport::new(
            PageSize {
                width_pt: 612.0,
                height_pt: 792.0,
            },
            2.0,
        );
        assert_eq!((vp.width_px, vp.height_px), (1224, 1584));
        assert_eq!(vp.scale, 2.0);
    }

    #[test]
    fn viewport_truncates_and_never_collapses() {
        let vp = Viewport::new(
            PageSize {
                width_pt: 595.3,
                height_pt: 0.1,
            },
            2.0,
        );
        assert_eq!((vp.width_px, vp.height_px), (1190, 1));
    }
}

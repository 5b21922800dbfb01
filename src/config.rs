//! Configuration types for PDF-to-image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The PDFium engine location lives in
//! the nested [`EngineConfig`], which is resolved once at startup and passed
//! in rather than read from globals mid-conversion.

use crate::cancel::CancelToken;
use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use pdfium_auto::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default render scale relative to the page's native size (1 pt → 2 px).
pub const DEFAULT_SCALE: f32 = 2.0;

/// Default preview size as a fraction of the full-resolution surface.
pub const DEFAULT_PREVIEW_SCALE: f32 = 0.3;

/// Configuration for a PDF-to-image conversion.
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::{ConversionConfig, PageErrorPolicy};
///
/// let config = ConversionConfig::builder()
///     .scale(3.0)
///     .on_page_error(PageErrorPolicy::Abort)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Render scale applied to each page's native geometry. Default: 2.0.
    ///
    /// 2.0 gives crisp text on high-density displays and in print. A US
    /// Letter page (612 × 792 pt) becomes a 1224 × 1584 px PNG.
    pub scale: f32,

    /// Preview down-sampling factor applied to the rendered surface. Default: 0.3.
    pub preview_scale: f32,

    /// What to do when a page renders but yields no image data. Default: skip.
    pub on_page_error: PageErrorPolicy,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Where to find (or fetch) the PDFium library.
    pub engine: EngineConfig,

    /// Optional progress callback; `None` means no events.
    pub progress_callback: Option<ProgressCallback>,

    /// Optional cancel token, checked between pages.
    pub cancel: Option<CancelToken>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            preview_scale: DEFAULT_PREVIEW_SCALE,
            on_page_error: PageErrorPolicy::default(),
            password: None,
            download_timeout_secs: 120,
            engine: EngineConfig::default(),
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("scale", &self.scale)
            .field("preview_scale", &self.preview_scale)
            .field("on_page_error", &self.on_page_error)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("engine", &self.engine)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn preview_scale(mut self, scale: f32) -> Self {
        self.config.preview_scale = scale;
        self
    }

    pub fn on_page_error(mut self, policy: PageErrorPolicy) -> Self {
        self.config.on_page_error = policy;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.config.engine = engine;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        let c = &self.config;
        if !c.scale.is_finite() || !(0.1..=10.0).contains(&c.scale) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "scale must be 0.1–10.0, got {}",
                c.scale
            )));
        }
        if !c.preview_scale.is_finite() || !(0.01..=1.0).contains(&c.preview_scale) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "preview scale must be 0.01–1.0, got {}",
                c.preview_scale
            )));
        }
        if c.download_timeout_secs == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the pipeline reacts when a rendered page yields no PNG data.
///
/// Render failures are always fatal; this only governs the encode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageErrorPolicy {
    /// Leave the page out of the archive and previews, record a
    /// [`crate::PageError`] and keep going. (default)
    #[default]
    Skip,
    /// Fail the whole conversion with [`Pdf2ImgError::EncodeFailed`].
    Abort,
}

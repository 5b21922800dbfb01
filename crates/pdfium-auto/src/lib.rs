//! # pdfium-auto
//!
//! Locate, download and cache [PDFium](https://pdfium.googlesource.com/pdfium/)
//! binaries so that `pdfium-render` users never have to install libpdfium by
//! hand or juggle `LD_LIBRARY_PATH` / `DYLD_LIBRARY_PATH`.
//!
//! ## Explicit configuration
//!
//! Where the library comes from is described by an [`EngineConfig`] that the
//! host application builds once at startup and passes down. Nothing in this
//! crate reads global state after that point: the release URL, the version
//! pin and the cache location are plain fields.
//!
//! ## Resolution order
//!
//! [`ensure_pdfium_library`] returns the first of:
//!
//! 1. `config.library_path`, if set (missing file is an error, not a fallback).
//! 2. `<cache_dir>/pdfium-<version>/<libname>` if already on disk.
//! 3. A fresh download of `<library_base_url>/chromium%2F<version>/<archive>`
//!    from [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    extracted into the cache directory.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfium_auto::{bind_pdfium, EngineConfig};
//!
//! let engine = EngineConfig::from_env();
//! let pdfium = bind_pdfium(&engine, Some(&|downloaded, total| {
//!     if let Some(t) = total {
//!         eprint!("\rDownloading PDFium: {}/{} bytes", downloaded, t);
//!     }
//! })).expect("PDFium unavailable");
//! ```
//!
//! ## Platform support
//!
//! | OS      | Arch    | Library               |
//! |---------|---------|-----------------------|
//! | macOS   | arm64   | `libpdfium.dylib`     |
//! | macOS   | x86_64  | `libpdfium.dylib`     |
//! | Linux   | x86_64  | `libpdfium.so`        |
//! | Linux   | aarch64 | `libpdfium.so`        |
//! | Windows | x86_64  | `pdfium.dll`          |
//! | Windows | aarch64 | `pdfium.dll`          |
//! | Windows | x86     | `pdfium.dll`          |

use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

// ── Defaults ─────────────────────────────────────────────────────────────────

/// Default pdfium-binaries release tag.
///
/// Maps to [`bblanchon/pdfium-binaries chromium/7690`](https://github.com/bblanchon/pdfium-binaries/releases/tag/chromium%2F7690).
pub const DEFAULT_PDFIUM_VERSION: &str = "7690";

/// Default GitHub release base URL.
pub const DEFAULT_BASE_URL: &str =
    "https://github.com/bblanchon/pdfium-binaries/releases/download";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-auto operations.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    /// The current OS/architecture combination is not supported.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// `library_path` was configured but nothing exists there.
    #[error("Configured PDFium library not found: '{0}'")]
    LibraryNotFound(PathBuf),

    /// Could not create or navigate the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `libloading` / `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Engine configuration ─────────────────────────────────────────────────────

/// Where the PDFium engine comes from.
///
/// Built once by the host (usually from CLI flags or [`EngineConfig::from_env`])
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Release download root; the version tag and archive name are appended.
    pub library_base_url: String,
    /// pdfium-binaries `chromium/<N>` tag.
    pub library_version: String,
    /// Cache root. `None` uses the platform cache dir (`~/.cache` on Linux).
    pub cache_dir: Option<PathBuf>,
    /// Pre-installed library. When set, no download is ever attempted.
    pub library_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_base_url: DEFAULT_BASE_URL.to_string(),
            library_version: DEFAULT_PDFIUM_VERSION.to_string(),
            cache_dir: None,
            library_path: None,
        }
    }
}

impl EngineConfig {
    /// Defaults, overridden by `PDFIUM_LIB_PATH`, `PDFIUM_AUTO_CACHE_DIR`,
    /// `PDFIUM_BASE_URL` and `PDFIUM_VERSION` when present and non-empty.
    ///
    /// Call this once at startup; the returned value is then passed around.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let mut config = Self::default();
        if let Some(url) = var("PDFIUM_BASE_URL") {
            config.library_base_url = url;
        }
        if let Some(version) = var("PDFIUM_VERSION") {
            config.library_version = version;
        }
        config.cache_dir = var("PDFIUM_AUTO_CACHE_DIR").map(PathBuf::from);
        config.library_path = var("PDFIUM_LIB_PATH").map(PathBuf::from);
        config
    }

    /// Per-version cache directory for the PDFium library.
    ///
    /// Default locations:
    /// - **macOS**: `~/Library/Caches/pdf2img/pdfium-{VERSION}/`
    /// - **Linux**: `~/.cache/pdf2img/pdfium-{VERSION}/`
    /// - **Windows**: `%LOCALAPPDATA%\pdf2img\pdfium-{VERSION}\`
    pub fn version_cache_dir(&self) -> PathBuf {
        let leaf = format!("pdfium-{}", self.library_version);
        match self.cache_dir {
            Some(ref root) => root.join(leaf),
            None => dirs::cache_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
                .unwrap_or_else(std::env::temp_dir)
                .join("pdf2img")
                .join(leaf),
        }
    }

    /// Full download URL of the release archive for `platform`.
    fn archive_url(&self, platform: &PlatformInfo) -> String {
        format!(
            "{}/chromium%2F{}/{}",
            self.library_base_url.trim_end_matches('/'),
            self.library_version,
            platform.archive_name
        )
    }
}

// ── Internal: platform metadata ──────────────────────────────────────────────

#[derive(Debug)]
struct PlatformInfo {
    /// Asset filename in the GitHub release, e.g. `pdfium-mac-arm64.tgz`.
    archive_name: &'static str,
    /// Relative path inside the archive, e.g. `lib/libpdfium.dylib`.
    lib_path_in_archive: &'static str,
    /// Filename to write on disk, e.g. `libpdfium.dylib`.
    lib_name: &'static str,
}

const fn target(
    archive_name: &'static str,
    lib_path_in_archive: &'static str,
    lib_name: &'static str,
) -> PlatformInfo {
    PlatformInfo {
        archive_name,
        lib_path_in_archive,
        lib_name,
    }
}

/// `(os, arch, info)` for every published pdfium-binaries target we use.
static PLATFORMS: &[(&str, &str, PlatformInfo)] = &[
    ("macos", "aarch64", target("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib")),
    ("macos", "x86_64", target("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib")),
    ("linux", "x86_64", target("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so")),
    ("linux", "aarch64", target("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so")),
    ("windows", "x86_64", target("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll")),
    ("windows", "aarch64", target("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll")),
    ("windows", "x86", target("pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll")),
];

fn platform_for(os: &str, arch: &str) -> Result<&'static PlatformInfo, PdfiumAutoError> {
    PLATFORMS
        .iter()
        .find(|(o, a, _)| *o == os && *a == arch)
        .map(|(_, _, info)| info)
        .ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

fn detect_platform() -> Result<&'static PlatformInfo, PdfiumAutoError> {
    platform_for(std::env::consts::OS, std::env::consts::ARCH)
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the on-disk path to the PDFium library, or `None` if a download
/// would be needed.
pub fn cached_pdfium_path(config: &EngineConfig) -> Option<PathBuf> {
    if let Some(ref p) = config.library_path {
        return p.exists().then(|| p.clone());
    }
    let info = detect_platform().ok()?;
    let p = config.version_cache_dir().join(info.lib_name);
    p.exists().then_some(p)
}

/// `true` when [`ensure_pdfium_library`] will not touch the network.
pub fn is_pdfium_cached(config: &EngineConfig) -> bool {
    cached_pdfium_path(config).is_some()
}

/// Ensures the PDFium dynamic library is present and returns its path.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)` during
/// the download. Pass `None` to suppress progress callbacks.
pub fn ensure_pdfium_library(
    config: &EngineConfig,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(ref p) = config.library_path {
        if p.exists() {
            return Ok(p.clone());
        }
        return Err(PdfiumAutoError::LibraryNotFound(p.clone()));
    }

    let info = detect_platform()?;
    let cache_dir = config.version_cache_dir();
    let lib_path = cache_dir.join(info.lib_name);

    if lib_path.exists() {
        return Ok(lib_path);
    }

    std::fs::create_dir_all(&cache_dir).map_err(PdfiumAutoError::CacheDir)?;

    let archive_bytes = download_bytes(&config.archive_url(info), on_progress)?;
    extract_library(&archive_bytes, info.lib_path_in_archive, &lib_path)?;

    Ok(lib_path)
}

/// Binds to PDFium, downloading it first if necessary.
pub fn bind_pdfium(
    config: &EngineConfig,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Pdfium, PdfiumAutoError> {
    let lib_path = ensure_pdfium_library(config, on_progress)?;
    bind_pdfium_from_path(&lib_path)
}

/// Binds to a PDFium library at an explicit `path`.
///
/// Does not interact with the download / cache layer.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Streams a URL into a `Vec<u8>`, calling `on_progress` every 64 KiB.
fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(35 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Extracts a single file from a gzipped tar archive into `dest_path`.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PdfiumAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(archive_bytes));
    let entries = archive
        .entries()
        .map_err(|e| PdfiumAutoError::Extract(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| PdfiumAutoError::Extract(e.to_string()))?;
        let matches = entry
            .path()
            .map_err(|e| PdfiumAutoError::Extract(e.to_string()))?
            .to_string_lossy()
            == lib_path_in_archive;

        if matches {
            entry
                .unpack(dest_path)
                .map_err(|e| PdfiumAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "Library '{}' not found in archive",
        lib_path_in_archive
    )))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

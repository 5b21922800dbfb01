//! CLI binary for edgequake-pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, writes the archive and prints a summary.

use anyhow::{Context, Result};
use base64::Engine as _;
use clap::Parser;
use edgequake_pdf2img::{
    convert_to_file, inspect, naming, CancelToken, ConversionConfig, ConversionConfigBuilder,
    ConversionOutput, ConversionProgressCallback, EngineConfig, PageErrorPolicy, Pdf2ImgError,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a single bar advanced once per page, with a
/// log line above it for every page left out of the archive.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    /// Starts as a spinner; `on_conversion_start` turns it into a bar once
    /// the page count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  {msg:>4}  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.set_message("0%");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rasterising {total_pages} pages…"))
        ));
    }

    fn on_progress(&self, page_num: usize, _total_pages: usize, percent: u8) {
        self.bar.set_position(page_num as u64);
        self.bar.set_message(format!("{percent}%"));
    }

    fn on_page_skipped(&self, page_num: usize, total_pages: usize, error: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
        ));
    }

    fn on_conversion_complete(&self, total_pages: usize, archived_pages: usize) {
        self.bar.finish_and_clear();

        let skipped = self.skipped.load(Ordering::SeqCst);
        if skipped == 0 {
            eprintln!(
                "{} {} pages rasterised",
                green("✔"),
                bold(&archived_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages archived  ({} skipped)",
                cyan("⚠"),
                bold(&archived_pages.to_string()),
                total_pages,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes report_images.zip)
  pdf2img report.pdf

  # Choose the archive path
  pdf2img report.pdf -o out/pages.zip

  # Higher resolution, fail on the first blank page
  pdf2img --scale 3 --on-page-error abort slides.pdf

  # Convert from URL and dump the previews as PNG files
  pdf2img https://arxiv.org/pdf/1706.03762 --previews-dir previews/

  # Inspect PDF metadata only
  pdf2img --inspect-only report.pdf

  # Structured JSON summary (previews included as data URLs)
  pdf2img --json report.pdf > summary.json

OUTPUT:
  <base>_images.zip           one entry per page, stored (PNG is already compressed)
  <base>_page_<N>.png         entry names, N is 1-indexed and not zero-padded

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  PDFIUM_BASE_URL         Override the pdfium-binaries download root
  PDFIUM_VERSION          Override the pdfium-binaries release tag
  RUST_LOG                tracing filter, overrides -v / -q

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdf2img/pdfium-<VERSION>/. No manual library setup is required.
"#;

/// Rasterise PDF pages into a ZIP archive of PNG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Rasterise PDF files and URLs into a ZIP of PNG page images",
    long_about = "Render every page of a PDF (local file or URL) to a PNG at a chosen scale \
and pack the images into <name>_images.zip, in page order.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the archive here instead of `<base>_images.zip`.
    #[arg(short, long, env = "PDF2IMG_OUTPUT")]
    output: Option<PathBuf>,

    /// Render scale relative to native page size (0.1–10).
    #[arg(long, env = "PDF2IMG_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Preview size as a fraction of the rendered page (0.01–1).
    #[arg(long, env = "PDF2IMG_PREVIEW_SCALE", default_value_t = 0.3)]
    preview_scale: f32,

    /// What to do when a page yields no image data.
    #[arg(long, env = "PDF2IMG_ON_PAGE_ERROR", value_enum, default_value = "skip")]
    on_page_error: PageErrorArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Also write each preview as `<base>_page_<N>_preview.png` into this directory.
    #[arg(long, env = "PDF2IMG_PREVIEWS_DIR")]
    previews_dir: Option<PathBuf>,

    /// Print a JSON summary (ConversionOutput) on stdout.
    #[arg(long, env = "PDF2IMG_JSON")]
    json: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2IMG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Use this libpdfium instead of the cached/downloaded one.
    #[arg(long, env = "PDF2IMG_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Download root for pdfium-binaries releases.
    #[arg(long, env = "PDF2IMG_PDFIUM_BASE_URL")]
    pdfium_base_url: Option<String>,

    /// pdfium-binaries release tag (chromium/<N>).
    #[arg(long, env = "PDF2IMG_PDFIUM_VERSION")]
    pdfium_version: Option<String>,

    /// Cache root for the downloaded pdfium library.
    #[arg(long, env = "PDF2IMG_PDFIUM_CACHE_DIR")]
    pdfium_cache_dir: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PageErrorArg {
    Skip,
    Abort,
}

impl From<PageErrorArg> for PageErrorPolicy {
    fn from(v: PageErrorArg) -> Self {
        match v {
            PageErrorArg::Skip => PageErrorPolicy::Skip,
            PageErrorArg::Abort => PageErrorPolicy::Abort,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would tear through the progress bar, so they are hidden
    // while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Ensure PDFium engine is available ───────────────────────────────
    let engine = engine_config(&cli);
    if !pdfium_auto::is_pdfium_cached(&engine) {
        prefetch_pdfium(&engine, cli.quiet)?;
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = base_builder(&cli, engine)
            .build()
            .context("Invalid configuration")?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let cli_cb = show_progress.then(CliProgressCallback::new_dynamic);

    let cancel = CancelToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut builder = base_builder(&cli, engine)
        .scale(cli.scale)
        .preview_scale(cli.preview_scale)
        .on_page_error(cli.on_page_error.clone().into())
        .cancel_token(cancel);
    if let Some(ref cb) = cli_cb {
        builder = builder.progress_callback(cb.clone() as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let (path, output) = match convert_to_file(&cli.input, cli.output.as_deref(), &config).await {
        Ok(done) => done,
        Err(e) => {
            if let Some(ref cb) = cli_cb {
                cb.bar.abandon();
            }
            if let Pdf2ImgError::Cancelled { completed, total } = &e {
                eprintln!(
                    "{} Cancelled after {}/{} pages, nothing written",
                    red("✘"),
                    completed,
                    total
                );
                std::process::exit(130);
            }
            return Err(e).context("Conversion failed");
        }
    };

    if let Some(ref dir) = cli.previews_dir {
        write_previews(dir, &output).await?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet && !cli.json {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {}  {}ms  →  {}",
            if stats.skipped_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.archived_pages,
            stats.total_pages,
            dim(&format!("{} bytes", stats.archive_bytes)),
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
        if !show_progress {
            for skipped in &output.skipped {
                eprintln!("   {} {}", red("✗"), skipped);
            }
        }
    }

    Ok(())
}

/// Settings shared by inspect and convert.
fn base_builder(cli: &Cli, engine: EngineConfig) -> ConversionConfigBuilder {
    let builder = ConversionConfig::builder()
        .download_timeout_secs(cli.download_timeout)
        .engine(engine);
    match cli.password {
        Some(ref pwd) => builder.password(pwd.clone()),
        None => builder,
    }
}

/// Environment defaults first, then explicit flags on top.
fn engine_config(cli: &Cli) -> EngineConfig {
    let mut engine = EngineConfig::from_env();
    if let Some(ref path) = cli.pdfium_lib {
        engine.library_path = Some(path.clone());
    }
    if let Some(ref url) = cli.pdfium_base_url {
        engine.library_base_url = url.clone();
    }
    if let Some(ref version) = cli.pdfium_version {
        engine.library_version = version.clone();
    }
    if let Some(ref dir) = cli.pdfium_cache_dir {
        engine.cache_dir = Some(dir.clone());
    }
    engine
}

/// Download the engine up front so the first conversion shows a byte-level
/// bar instead of a silent pause.
fn prefetch_pdfium(engine: &EngineConfig, quiet: bool) -> Result<()> {
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(engine, None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    // block_in_place lets the borrowed callback live on this stack frame.
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(
            engine,
            Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length().unwrap_or(0) != t {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }),
        )
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Decode each preview data URL back to PNG bytes and write it next to its
/// siblings as `<base>_page_<N>_preview.png`.
async fn write_previews(dir: &Path, output: &ConversionOutput) -> Result<()> {
    let base = naming::archive_base(&output.output_name);

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for preview in &output.previews {
        let payload = preview
            .data_url
            .split_once(',')
            .map(|(_, b64)| b64)
            .context("Malformed preview data URL")?;
        let png = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("Preview is not valid base64")?;

        let path = dir.join(format!("{base}_page_{}_preview.png", preview.page_num));
        tokio::fs::write(&path, png)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

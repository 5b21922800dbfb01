//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline finishes each page.
//!
//! The pipeline is strictly sequential, so events arrive in page order and
//! never concurrently. The trait is still `Send + Sync` because the pipeline
//! runs on a `spawn_blocking` thread, not the caller's.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2img::{progress, ConversionConfig};
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(progress::percent_fn(|pct| eprintln!("{pct}%")))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document is decoded, before any page renders.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rasterised.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called exactly once per source page, after that page is fully
    /// processed — whether or not it made it into the archive.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    /// * `percent`     — `round(page_num / total_pages * 100)`
    fn on_progress(&self, page_num: usize, total_pages: usize, percent: u8) {
        let _ = (page_num, total_pages, percent);
    }

    /// Called when a page produced no image data and was left out of the
    /// archive (skip policy only). Always precedes that page's `on_progress`.
    fn on_page_skipped(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the archive is finalised.
    ///
    /// # Arguments
    /// * `total_pages`    — total pages in the document
    /// * `archived_pages` — pages written to the archive
    fn on_conversion_complete(&self, total_pages: usize, archived_pages: usize) {
        let _ = (total_pages, archived_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Adapter turning a plain `Fn(percent)` closure into a progress callback.
pub struct PercentFn<F>(F);

impl<F> ConversionProgressCallback for PercentFn<F>
where
    F: Fn(u8) + Send + Sync,
{
    fn on_progress(&self, _page_num: usize, _total_pages: usize, percent: u8) {
        (self.0)(percent)
    }
}

/// Wrap a percentage-only closure as a [`ProgressCallback`].
pub fn percent_fn<F>(f: F) -> ProgressCallback
where
    F: Fn(u8) + Send + Sync + 'static,
{
    Arc::new(PercentFn(f))
}

/// Percentage of `done` out of `total`, rounded half-up, in `0..=100`.
///
/// Integer arithmetic so 1/2 → 50 and 1/200 → 1 exactly, with no float
/// representation surprises. A zero `total` reports 0.
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((done * 200 + total) / (total * 2)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(1, 2), 50);
        assert_eq!(progress_percent(1, 8), 13); // 12.5 → 13
        assert_eq!(progress_percent(1, 200), 1); // 0.5 → 1
        assert_eq!(progress_percent(1, 201), 0);
    }

    #[test]
    fn percent_edges() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(0, 5), 0);
        assert_eq!(progress_percent(9, 5), 100);
    }

    #[test]
    fn percent_is_monotonic() {
        for total in 1..=250 {
            let seq: Vec<u8> = (1..=total).map(|i| progress_percent(i, total)).collect();
            assert!(seq.windows(2).all(|w| w[0] <= w[1]), "total={total}");
            assert_eq!(*seq.last().unwrap(), 100);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_page_start(1, 5);
        cb.on_progress(1, 5, 20);
        cb.on_page_skipped(2, 5, "empty");
        cb.on_conversion_complete(5, 4);
    }

    #[test]
    fn percent_fn_forwards_only_percentages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb = percent_fn(move |p| sink.lock().unwrap().push(p));

        cb.on_conversion_start(2);
        cb.on_page_start(1, 2);
        cb.on_progress(1, 2, 50);
        cb.on_page_skipped(2, 2, "empty");
        cb.on_progress(2, 2, 100);
        cb.on_conversion_complete(2, 1);

        assert_eq!(*seen.lock().unwrap(), vec![50, 100]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        struct Counter(AtomicUsize);
        impl ConversionProgressCallback for Counter {
            fn on_progress(&self, _: usize, _: usize, _: u8) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let cb: ProgressCallback = counter.clone();
        cb.on_progress(1, 10, 10);
        cb.on_progress(2, 10, 20);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}

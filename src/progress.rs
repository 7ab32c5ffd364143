//! Progress-callback trait for split events.
//!
//! Inject an [`Arc<dyn SplitProgressCallback>`] via
//! [`crate::config::SplitConfigBuilder::progress_callback`] to observe the
//! pipeline as it renders pages and crops regions.
//!
//! # Example
//!
//! ```rust
//! use pdf2problems::{SplitConfig, SplitProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     kept: AtomicUsize,
//! }
//!
//! impl SplitProgressCallback for CountingCallback {
//!     fn on_region_complete(&self, _index: usize, _total: usize, label: &str, kept: bool) {
//!         if kept {
//!             self.kept.fetch_add(1, Ordering::SeqCst);
//!             eprintln!("cropped {label}");
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { kept: AtomicUsize::new(0) });
//!
//! let config = SplitConfig::builder()
//!     .progress_callback(counter as Arc<dyn SplitProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the split pipeline as it progresses.
///
/// Implementations must be `Send + Sync`: pages are rendered on a blocking
/// thread and regions are cropped concurrently, so `on_region_complete` may
/// be called from several threads and out of boundary order. All methods
/// default to no-ops.
pub trait SplitProgressCallback: Send + Sync {
    /// Called once the number of pages to render is known.
    fn on_split_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page is rasterised (1-indexed position in the selection).
    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once boundaries are known.
    ///
    /// `fell_back` is true when auto mode found no numbered problem and
    /// the canvas was divided into equal sections instead.
    fn on_boundaries_detected(&self, count: usize, fell_back: bool) {
        let _ = (count, fell_back);
    }

    /// Called per boundary after slicing and cropping.
    ///
    /// `kept` is false when the region was too thin and got dropped.
    fn on_region_complete(&self, index: usize, total: usize, label: &str, kept: bool) {
        let _ = (index, total, label, kept);
    }

    /// Called once with the number of problem images produced.
    fn on_split_complete(&self, emitted: usize) {
        let _ = emitted;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SplitProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SplitConfig`].
pub type ProgressCallback = Arc<dyn SplitProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        pages: AtomicUsize,
        kept: AtomicUsize,
        dropped: AtomicUsize,
        labels: Mutex<Vec<String>>,
    }

    impl SplitProgressCallback for TrackingCallback {
        fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_region_complete(&self, _index: usize, _total: usize, label: &str, kept: bool) {
            if kept {
                self.kept.fetch_add(1, Ordering::SeqCst);
            } else {
                self.dropped.fetch_add(1, Ordering::SeqCst);
            }
            self.labels.lock().unwrap().push(label.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_split_start(3);
        cb.on_page_rendered(1, 3);
        cb.on_boundaries_detected(4, false);
        cb.on_region_complete(0, 4, "Problem 1", true);
        cb.on_split_complete(4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_page_rendered(1, 2);
        tracker.on_page_rendered(2, 2);
        tracker.on_region_complete(0, 2, "Problem 1", true);
        tracker.on_region_complete(1, 2, "Problem 2", false);

        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.kept.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.dropped.load(Ordering::SeqCst), 1);
        assert_eq!(
            *tracker.labels.lock().unwrap(),
            vec!["Problem 1".to_string(), "Problem 2".to_string()]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_split_start(1);
        cb.on_split_complete(0);
    }
}

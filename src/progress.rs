//! Progress-callback trait for batch events.
//!
//! The runner reports what it is doing through an
//! `Arc<dyn BatchProgressCallback>`; the CLI renders the events as an
//! indicatif bar, tests count them, and library embedders can forward them
//! anywhere. All methods default to no-ops so implementors only override
//! what they care about. The batch loop is strictly sequential, so no
//! method is ever called concurrently.

use std::sync::Arc;

/// Called by [`crate::runner::BatchRunner`] as it works through documents.
pub trait BatchProgressCallback: Send + Sync {
    /// A document is about to be processed.
    fn on_document_start(&self, pdf_name: &str) {
        let _ = pdf_name;
    }

    /// A document was skipped because it is already marked complete.
    fn on_document_skipped(&self, pdf_name: &str) {
        let _ = pdf_name;
    }

    /// Rasterisation finished; `selected` pages of `total` will be sent.
    fn on_rasterized(&self, pdf_name: &str, total: usize, selected: usize) {
        let _ = (pdf_name, total, selected);
    }

    /// One page finished (successfully or not).
    fn on_page_done(&self, page_num: usize, success: bool) {
        let _ = (page_num, success);
    }

    /// A document's artifacts were written and it was marked complete.
    fn on_document_complete(&self, pdf_name: &str, pages_processed: usize) {
        let _ = (pdf_name, pages_processed);
    }

    /// A document hit a fatal fault and was recorded in the failure list.
    fn on_document_failed(&self, pdf_name: &str, error: &str) {
        let _ = (pdf_name, error);
    }
}

/// No-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias for the type the runner stores.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCallback {
        started: AtomicUsize,
        skipped: AtomicUsize,
        pages: AtomicUsize,
        completed: AtomicUsize,
        failed: AtomicUsize,
    }

    impl BatchProgressCallback for CountingCallback {
        fn on_document_start(&self, _: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_skipped(&self, _: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
        fn on_page_done(&self, _: usize, _: bool) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_complete(&self, _: &str, _: usize) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_document_failed(&self, _: &str, _: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_document_start("119.pdf");
        cb.on_rasterized("119.pdf", 10, 3);
        cb.on_page_done(3, true);
        cb.on_page_done(4, false);
        cb.on_document_complete("119.pdf", 3);
        cb.on_document_failed("7.pdf", "corrupt file");
        cb.on_document_skipped("5.pdf");
    }

    #[test]
    fn counting_callback_receives_events() {
        let cb = CountingCallback::default();
        cb.on_document_start("a.pdf");
        cb.on_page_done(1, true);
        cb.on_page_done(2, false);
        cb.on_document_complete("a.pdf", 2);
        cb.on_document_skipped("b.pdf");
        cb.on_document_failed("c.pdf", "boom");

        assert_eq!(cb.started.load(Ordering::SeqCst), 1);
        assert_eq!(cb.pages.load(Ordering::SeqCst), 2);
        assert_eq!(cb.completed.load(Ordering::SeqCst), 1);
        assert_eq!(cb.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(cb.failed.load(Ordering::SeqCst), 1);
    }
}

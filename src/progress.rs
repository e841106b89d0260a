//! Progress-callback trait for per-batch rendering events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::RenderConfigBuilder::progress_callback`] to receive
//! events as the pipeline submits each batch. The `tracing` log stream
//! carries the same milestones; the callback is for hosts that want
//! structured numbers (progress bars, UI sinks) rather than text.
//!
//! # Example
//!
//! ```rust
//! use zpl2pdf::{RenderConfig, RenderProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl RenderProgressCallback for CountingCallback {
//!     fn on_batch_complete(&self, batch: usize, total: usize, path: &Path, bytes: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("batch {batch}/{total}: {bytes} bytes -> {}", path.display());
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//! let config = RenderConfig::builder()
//!     .progress_callback(cb as Arc<dyn RenderProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the rendering pipeline as it works through the batches.
///
/// Batches are submitted strictly one after another, so the methods are
/// never invoked concurrently for the same run. Implementations are still
/// `Send + Sync` because one callback may be shared by several runs.
/// All methods default to no-ops.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once after segmentation and batch planning.
    ///
    /// # Arguments
    /// * `total_labels`  — labels found in the input
    /// * `total_batches` — requests that will be made
    fn on_render_start(&self, total_labels: usize, total_batches: usize) {
        let _ = (total_labels, total_batches);
    }

    /// Called just before a batch waits on the rate gate.
    ///
    /// # Arguments
    /// * `batch`       — 1-indexed batch number
    /// * `total`       — total batches in the run
    /// * `label_count` — labels packed into this batch
    /// * `bytes`       — UTF-8 payload size
    fn on_batch_start(&self, batch: usize, total: usize, label_count: usize, bytes: usize) {
        let _ = (batch, total, label_count, bytes);
    }

    /// Called when a batch's PDF has been written.
    fn on_batch_complete(&self, batch: usize, total: usize, path: &Path, bytes: usize) {
        let _ = (batch, total, path, bytes);
    }

    /// Called when a batch fails (render, transport, write or cancel).
    fn on_batch_error(&self, batch: usize, total: usize, error: &str) {
        let _ = (batch, total, error);
    }

    /// Called once when the run ends, including runs stopped by an aborting
    /// failure or a cancellation. `succeeded` counts the PDFs written; the
    /// returned error says why the run stopped.
    fn on_render_complete(&self, total_batches: usize, succeeded: usize) {
        let _ = (total_batches, succeeded);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;

//! Error types for the zpl2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ZplError`] — **Fatal**: the run cannot proceed or was stopped
//!   (unreadable input, bad configuration, output directory unusable, a
//!   batch failure under [`crate::config::FailurePolicy::Abort`]). Returned
//!   as `Err(ZplError)` from the top-level `render*` functions.
//!
//! * [`BatchError`] — **Non-fatal**: a single batch failed (the service
//!   rejected it, the connection dropped, the PDF could not be written) but
//!   the batch sequence itself is intact. Stored inside
//!   [`crate::output::BatchResult`] so callers running with
//!   [`crate::config::FailurePolicy::Continue`] can inspect partial success.
//!
//! Estimation problems never appear here: a malformed `~DG` or `^GF`
//! directive simply contributes zero to the asset estimate.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the zpl2pdf library.
///
/// Batch-level failures use [`BatchError`] and are stored in
/// [`crate::output::BatchResult`] rather than propagated here, unless the
/// run aborts on them (see [`ZplError::BatchFailed`]).
#[derive(Debug, Error)]
pub enum ZplError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("ZPL file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// A batch failed and the run was configured to stop on the first
    /// failure. Artifacts written before the failure stay on disk and are
    /// listed in `written`.
    #[error("{source}")]
    BatchFailed {
        #[source]
        source: BatchError,
        written: Vec<PathBuf>,
    },

    /// Every batch failed; no artifact was produced.
    #[error("All {total} batches failed.\nFirst error: {first_error}")]
    AllBatchesFailed { total: usize, first_error: String },

    /// Some batches succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::RenderOutput::into_result`] when the
    /// caller wants to treat any batch failure as an error.
    #[error("{failed}/{total} batches failed during rendering")]
    PartialFailure {
        succeeded: usize,
        failed: usize,
        total: usize,
    },

    /// The run was cancelled before all batches were submitted.
    #[error("Rendering cancelled after {completed} of {total} batches")]
    Cancelled { completed: usize, total: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single batch.
///
/// Batch numbers are 1-indexed and match the `NNN` part of the artifact
/// file name the batch would have produced.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum BatchError {
    /// The rendering service answered with a non-success status.
    #[error("Batch {batch}: render failed ({status}): {reason}")]
    RenderFailed {
        batch: usize,
        status: u16,
        reason: String,
        body: String,
    },

    /// The request never produced a response (connect error, timeout, body
    /// read error).
    #[error("Batch {batch}: request failed: {detail}")]
    Transport { batch: usize, detail: String },

    /// The rendered PDF could not be written to disk.
    #[error("Batch {batch}: failed to write '{path}': {detail}")]
    PersistFailed {
        batch: usize,
        path: PathBuf,
        detail: String,
    },

    /// The batch was abandoned because the run was cancelled.
    #[error("Batch {batch}: cancelled")]
    Cancelled { batch: usize },
}

impl BatchError {
    /// 1-indexed batch number this error belongs to.
    pub fn batch(&self) -> usize {
        match self {
            BatchError::RenderFailed { batch, .. }
            | BatchError::Transport { batch, .. }
            | BatchError::PersistFailed { batch, .. }
            | BatchError::Cancelled { batch } => *batch,
        }
    }

    /// HTTP status code, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            BatchError::RenderFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Re-label the error with the batch number assigned by the orchestrator.
    pub(crate) fn with_batch(mut self, n: usize) -> Self {
        match &mut self {
            BatchError::RenderFailed { batch, .. }
            | BatchError::Transport { batch, .. }
            | BatchError::PersistFailed { batch, .. }
            | BatchError::Cancelled { batch } => *batch = n,
        }
        self
    }
}

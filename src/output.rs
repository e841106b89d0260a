//! Result types returned by the rendering entry points.

use crate::error::{BatchError, ZplError};
use crate::pipeline::batch::BatchSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// 1-indexed batch number.
    pub batch: usize,
    /// 1-indexed position of the first label of the batch.
    pub first_label: usize,
    pub label_count: usize,
    /// UTF-8 request payload size.
    pub bytes: usize,
    /// Estimated embedded graphic bytes.
    pub asset_bytes: u64,
    /// Written PDF, when the batch succeeded.
    pub path: Option<PathBuf>,
    /// Size of the PDF returned by the service.
    pub response_bytes: usize,
    /// Gate wait + request + write.
    pub duration_ms: u64,
    pub error: Option<BatchError>,
}

impl BatchResult {
    pub(crate) fn planned(summary: &BatchSummary) -> Self {
        Self {
            batch: summary.batch,
            first_label: summary.first_label,
            label_count: summary.label_count,
            bytes: summary.bytes,
            asset_bytes: summary.asset_bytes,
            path: None,
            response_bytes: 0,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub total_labels: usize,
    pub total_batches: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_bytes_sent: u64,
    pub total_bytes_received: u64,
    pub duration_ms: u64,
}

/// Everything a run produced, in submission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Written PDFs, in submission order.
    pub files: Vec<PathBuf>,
    pub batches: Vec<BatchResult>,
    pub stats: RenderStats,
}

impl RenderOutput {
    /// Treat any failed batch as an error.
    ///
    /// Useful with [`crate::config::FailurePolicy::Continue`] when the caller
    /// wants every batch attempted but still needs a hard failure at the end.
    pub fn into_result(self) -> Result<Self, ZplError> {
        if self.stats.failed == 0 {
            Ok(self)
        } else {
            Err(ZplError::PartialFailure {
                succeeded: self.stats.succeeded,
                failed: self.stats.failed,
                total: self.stats.total_batches,
            })
        }
    }
}

/// Dry-run view of how an input would be batched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub total_labels: usize,
    pub total_bytes: usize,
    pub total_asset_bytes: u64,
    pub batches: Vec<BatchSummary>,
}

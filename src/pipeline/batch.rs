//! Batch construction: greedy packing of consecutive labels into requests.
//!
//! Three bounds apply at once (label count, UTF-8 payload bytes, estimated
//! graphic bytes) because the service limits each of them separately. The
//! scan takes labels in order until the next one would break a bound.
//!
//! The first label of a batch is always taken, even when it alone is over a
//! byte bound. An oversized label therefore travels in a batch of its own
//! and the service decides whether to accept it. Labels are never dropped
//! or split.

use crate::config::BatchLimits;
use crate::pipeline::segment::Label;
use serde::{Deserialize, Serialize};

/// A contiguous run of labels joined into one request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    start: usize,
    label_count: usize,
    byte_len: usize,
    asset_bytes: u64,
    payload: String,
}

impl Batch {
    /// Index of the first label in the full label sequence.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of labels consumed from the sequence. Always ≥ 1.
    pub fn label_count(&self) -> usize {
        self.label_count
    }

    /// UTF-8 size of the payload.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn asset_bytes(&self) -> u64 {
        self.asset_bytes
    }

    /// The concatenated label text.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn summary(&self, number: usize) -> BatchSummary {
        BatchSummary {
            batch: number,
            first_label: self.start + 1,
            label_count: self.label_count,
            bytes: self.byte_len,
            asset_bytes: self.asset_bytes,
        }
    }
}

/// Serializable description of a planned batch (no payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// 1-indexed batch number.
    pub batch: usize,
    /// 1-indexed position of the batch's first label in the input.
    pub first_label: usize,
    pub label_count: usize,
    pub bytes: usize,
    pub asset_bytes: u64,
}

/// Build the batch that starts at `labels[start]`.
///
/// Returns the batch and the number of labels it consumed, or `None` when
/// `start` is past the end.
pub fn build_batch(labels: &[Label], start: usize, limits: &BatchLimits) -> Option<(Batch, usize)> {
    let remaining = labels.get(start..).filter(|rest| !rest.is_empty())?;

    let mut bytes: usize = 0;
    let mut assets: u64 = 0;
    let mut used = 0;

    for label in remaining.iter().take(limits.max_labels.max(1)) {
        let next_bytes = bytes.saturating_add(label.byte_len());
        let next_assets = assets.saturating_add(label.asset_bytes());
        if used > 0 && (next_bytes > limits.max_bytes || next_assets > limits.max_asset_bytes) {
            break;
        }
        bytes = next_bytes;
        assets = next_assets;
        used += 1;
    }

    let mut payload = String::with_capacity(bytes);
    for label in &remaining[..used] {
        payload.push_str(label.text());
    }

    let batch = Batch {
        start,
        label_count: used,
        byte_len: bytes,
        asset_bytes: assets,
        payload,
    };
    Some((batch, used))
}

/// Partition the whole label sequence into batches, in order.
pub fn plan_batches(labels: &[Label], limits: &BatchLimits) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut idx = 0;
    while let Some((batch, used)) = build_batch(labels, idx, limits) {
        idx += used;
        batches.push(batch);
    }
    batches
}

//! Streaming rendering API: emit each batch as soon as its PDF is written.
//!
//! Batches are still submitted one at a time and in order; the stream only
//! changes *when* the caller sees each outcome. Nothing is submitted until
//! the stream is polled, and dropping it stops the run after the batch in
//! flight.
//!
//! Under [`FailurePolicy::Abort`] the stream ends right after yielding the
//! first `Err`. Under [`FailurePolicy::Continue`] every batch is attempted.
//! The completion callback fires when the stream ends on its own, not when
//! the caller drops it early.

use crate::config::{FailurePolicy, RenderConfig};
use crate::error::{BatchError, ZplError};
use crate::output::BatchResult;
use crate::pipeline::batch::{self, Batch};
use crate::pipeline::submit::{LabelRenderer, RateGate};
use crate::pipeline::{persist, segment};
use crate::render::{notify_complete, resolve_gate, resolve_renderer, run_batch};
use futures::stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of batch outcomes, in submission order.
pub type BatchStream = Pin<Box<dyn Stream<Item = Result<BatchResult, BatchError>> + Send>>;

/// Render a ZPL text blob, streaming per-batch outcomes.
///
/// # Returns
/// - `Ok(BatchStream)` — empty when the input has no labels
/// - `Err(ZplError)` — the HTTP client or output directory could not be set up
pub async fn render_stream(zpl: &str, config: &RenderConfig) -> Result<BatchStream, ZplError> {
    info!("Starting streaming render: {} bytes of ZPL", zpl.len());

    let labels = segment::split_labels(zpl);
    let batches = batch::plan_batches(&labels, &config.limits);
    let total = batches.len();
    info!("Found {} ^XA labels in {} batch(es)", labels.len(), total);
    if batches.is_empty() {
        return Ok(Box::pin(stream::empty()));
    }

    let renderer = resolve_renderer(config)?;
    let gate = resolve_gate(config);
    persist::ensure_output_dir(&config.output_dir).await?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start(labels.len(), total);
    }

    let state = StreamState {
        batches: batches.into_iter().enumerate(),
        total,
        date: persist::date_stamp(),
        config: config.clone(),
        renderer,
        gate,
        succeeded: 0,
        done: false,
    };

    let s = stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }
        let Some((i, b)) = st.batches.next() else {
            notify_complete(&st.config, st.total, st.succeeded);
            return None;
        };
        let number = i + 1;
        let result = run_batch(
            st.renderer.as_ref(),
            &st.gate,
            &st.config.output_dir,
            &st.date,
            number,
            st.total,
            &b,
            &st.config,
        )
        .await;

        let item = match result.error.clone() {
            None => {
                st.succeeded += 1;
                Ok(result)
            }
            Some(err) => {
                st.done = matches!(err, BatchError::Cancelled { .. })
                    || st.config.failure_policy == FailurePolicy::Abort;
                if st.done {
                    notify_complete(&st.config, st.total, st.succeeded);
                }
                Err(err)
            }
        };
        Some((item, st))
    });

    Ok(Box::pin(s))
}

struct StreamState {
    batches: std::iter::Enumerate<std::vec::IntoIter<Batch>>,
    total: usize,
    date: String,
    config: RenderConfig,
    renderer: Arc<dyn LabelRenderer>,
    gate: Arc<RateGate>,
    succeeded: usize,
    done: bool,
}

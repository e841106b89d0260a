//! Rate-limited submission: pace requests and turn a batch into PDF bytes.
//!
//! This is the only stage with network I/O. Every call goes through the
//! same three steps:
//!
//! 1. wait on the [`RateGate`] until the next dispatch slot opens;
//! 2. claim the slot (`next = now + min_interval`) *before* sending, so the
//!    spacing holds from dispatch to dispatch even when a response hangs;
//! 3. POST the UTF-8 payload through a [`LabelRenderer`].
//!
//! There is no retry. A failed batch is reported with its status code and the
//! orchestrator applies the configured [`crate::config::FailurePolicy`].

use crate::cancel::CancelToken;
use crate::config::RenderConfig;
use crate::error::{BatchError, ZplError};
use crate::pipeline::batch::Batch;
use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Single-slot pacing gate shared by every submission of a run.
///
/// The slot timestamp sits behind an async mutex that is held across the
/// wait, so concurrent callers (several runs sharing one gate through an
/// `Arc`) queue up and still leave `min_interval` between dispatches.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateGate {
    /// A gate whose first slot is open immediately.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next slot and claim it. Returns the dispatch instant.
    ///
    /// Dropping the future while it waits leaves the gate untouched. Once it
    /// has returned, the claimed slot stays claimed whatever happens to the
    /// request.
    pub async fn acquire(&self) -> Instant {
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        if *next > now {
            debug!("Rate gate: waiting {:?}", *next - now);
            sleep_until(*next).await;
        }
        let dispatch = Instant::now();
        *next = dispatch + self.min_interval;
        dispatch
    }
}

/// Process-wide gates, one per interval.
static SHARED_GATES: Lazy<StdMutex<HashMap<Duration, Arc<RateGate>>>> =
    Lazy::new(|| StdMutex::new(HashMap::new()));

/// The process-wide gate for `min_interval`, created on first use.
///
/// Every run without an explicit gate paces through this one, so two runs
/// started back to back in the same process still leave `min_interval`
/// between their dispatches.
pub fn shared_gate(min_interval: Duration) -> Arc<RateGate> {
    let mut gates = SHARED_GATES.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(
        gates
            .entry(min_interval)
            .or_insert_with(|| Arc::new(RateGate::new(min_interval))),
    )
}

/// Transport that turns one batch payload into rendered PDF bytes.
///
/// [`HttpRenderer`] is the production implementation. Supply your own via
/// [`crate::config::RenderConfigBuilder::renderer`] to add middleware or to
/// test without a network. Errors may leave the batch number at 0; the
/// submitter fills it in.
pub trait LabelRenderer: Send + Sync {
    fn render<'a>(&'a self, payload: &'a str) -> BoxFuture<'a, Result<Vec<u8>, BatchError>>;
}

/// Labelary HTTP client.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self, ZplError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("zpl2pdf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ZplError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl LabelRenderer for HttpRenderer {
    fn render<'a>(&'a self, payload: &'a str) -> BoxFuture<'a, Result<Vec<u8>, BatchError>> {
        Box::pin(async move {
            let body = payload.as_bytes().to_vec();
            info!("→ POST {} bytes to {}", body.len(), self.endpoint);

            let response = self
                .client
                .post(&self.endpoint)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(ACCEPT, "application/pdf")
                .body(body)
                .send()
                .await
                .map_err(|e| BatchError::Transport {
                    batch: 0,
                    detail: e.to_string(),
                })?;

            let status = response.status();
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            info!("← {} {}", status.as_u16(), reason);

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
                warn!("Render rejected ({}): {}", status.as_u16(), body.trim());
                return Err(BatchError::RenderFailed {
                    batch: 0,
                    status: status.as_u16(),
                    reason,
                    body,
                });
            }

            let bytes = response.bytes().await.map_err(|e| BatchError::Transport {
                batch: 0,
                detail: format!("reading response body: {e}"),
            })?;

            if bytes.is_empty() {
                return Err(BatchError::RenderFailed {
                    batch: 0,
                    status: status.as_u16(),
                    reason: "empty response body".into(),
                    body: String::new(),
                });
            }

            debug!("Received {} bytes", bytes.len());
            Ok(bytes.to_vec())
        })
    }
}

/// Rendered PDF for one batch, owned by the orchestrator until written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// 1-indexed batch number; becomes the `NNN` of the file name.
    pub index: usize,
    pub bytes: Vec<u8>,
}

/// Pace, dispatch and classify one batch.
///
/// With a cancel token, cancellation during the gate wait or the request
/// yields [`BatchError::Cancelled`] and no artifact.
pub async fn submit_batch(
    renderer: &dyn LabelRenderer,
    gate: &RateGate,
    number: usize,
    batch: &Batch,
    cancel: Option<&CancelToken>,
) -> Result<RenderedArtifact, BatchError> {
    let work = async {
        gate.acquire().await;
        renderer.render(batch.payload()).await
    };

    let result = match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(BatchError::Cancelled { batch: number }),
                r = work => r,
            }
        }
        None => work.await,
    };

    result
        .map(|bytes| RenderedArtifact {
            index: number,
            bytes,
        })
        .map_err(|e| e.with_batch(number))
}

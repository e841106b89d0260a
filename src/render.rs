//! Eager (whole-run) rendering entry points.
//!
//! [`render`] segments the input, plans every batch up front, then submits
//! and persists the batches one at a time, in order, and returns once the
//! last one is done. Use [`crate::stream::render_stream`] to receive each
//! batch's outcome as soon as it is written.

use crate::cancel::CancelToken;
use crate::config::{FailurePolicy, RenderConfig};
use crate::error::{BatchError, ZplError};
use crate::output::{BatchPlan, BatchResult, RenderOutput, RenderStats};
use crate::pipeline::batch::{self, Batch};
use crate::pipeline::submit::{self, HttpRenderer, LabelRenderer, RateGate};
use crate::pipeline::{input, persist, segment};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Render a ZPL text blob to PDF files.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(RenderOutput)` with the written files in submission order. Input
/// without any label yields an empty output. Under
/// [`FailurePolicy::Continue`], failed batches are listed in
/// `output.batches` and counted in `output.stats.failed`.
///
/// # Errors
/// - the output directory cannot be created
/// - a batch fails under [`FailurePolicy::Abort`] ([`ZplError::BatchFailed`])
/// - every batch fails ([`ZplError::AllBatchesFailed`])
/// - the run is cancelled ([`ZplError::Cancelled`])
pub async fn render(zpl: &str, config: &RenderConfig) -> Result<RenderOutput, ZplError> {
    let run_start = Instant::now();
    info!("Starting render: {} bytes of ZPL", zpl.len());

    // ── Step 1: Segment ──────────────────────────────────────────────────
    let labels = segment::split_labels(zpl);
    info!("Found {} ^XA labels", labels.len());
    if labels.is_empty() {
        return Ok(RenderOutput::default());
    }

    // ── Step 2: Plan batches ─────────────────────────────────────────────
    let batches = batch::plan_batches(&labels, &config.limits);
    let total = batches.len();
    info!("Batching into {} call(s)", total);

    // ── Step 3: Transport, gate, output dir ──────────────────────────────
    let renderer = resolve_renderer(config)?;
    let gate = resolve_gate(config);
    persist::ensure_output_dir(&config.output_dir).await?;
    let date = persist::date_stamp();

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start(labels.len(), total);
    }

    // ── Step 4: Submit and persist, strictly in order ────────────────────
    let mut files = Vec::with_capacity(total);
    let mut results: Vec<BatchResult> = Vec::with_capacity(total);

    for (i, b) in batches.iter().enumerate() {
        let number = i + 1;
        let result = run_batch(
            renderer.as_ref(),
            &gate,
            &config.output_dir,
            &date,
            number,
            total,
            b,
            config,
        )
        .await;

        match (&result.path, &result.error) {
            (Some(path), _) => files.push(path.clone()),
            (None, Some(BatchError::Cancelled { .. })) => {
                warn!("Render cancelled at batch {}/{}", number, total);
                notify_complete(config, total, files.len());
                return Err(ZplError::Cancelled {
                    completed: files.len(),
                    total,
                });
            }
            (None, Some(err)) if config.failure_policy == FailurePolicy::Abort => {
                warn!(
                    "Stopping after batch {}/{} failed; {} remaining batch(es) not sent",
                    number,
                    total,
                    total - number
                );
                notify_complete(config, total, files.len());
                return Err(ZplError::BatchFailed {
                    source: err.clone(),
                    written: files,
                });
            }
            _ => {}
        }
        results.push(result);
    }

    // ── Step 5: Stats ────────────────────────────────────────────────────
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    let failed = total - succeeded;

    if succeeded == 0 {
        let first_error = results
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        notify_complete(config, total, 0);
        return Err(ZplError::AllBatchesFailed { total, first_error });
    }

    let stats = RenderStats {
        total_labels: labels.len(),
        total_batches: total,
        succeeded,
        failed,
        total_bytes_sent: results.iter().map(|r| r.bytes as u64).sum(),
        total_bytes_received: results.iter().map(|r| r.response_bytes as u64).sum(),
        duration_ms: run_start.elapsed().as_millis() as u64,
    };

    info!(
        "Render complete: {}/{} batches, {} PDF(s) saved, {}ms",
        succeeded,
        total,
        files.len(),
        stats.duration_ms
    );

    notify_complete(config, total, succeeded);

    Ok(RenderOutput {
        files,
        batches: results,
        stats,
    })
}

/// Read a `.txt` file and render it.
///
/// Blank files are skipped (empty output), as is text without any `^XA`.
pub async fn render_file(
    path: impl AsRef<Path>,
    config: &RenderConfig,
) -> Result<RenderOutput, ZplError> {
    let path = path.as_ref();
    let zpl = input::read_input(path).await?;
    if zpl.trim().is_empty() {
        info!("Empty file, skipping: {}", path.display());
        return Ok(RenderOutput::default());
    }
    render(&zpl, config).await
}

/// Discover `.txt` inputs under `paths` and render each in turn.
///
/// One file's failure (unreadable, rejected batch) is logged and recorded,
/// and the next file still runs. All files share one HTTP client and one
/// rate gate. With more than one input, each file's PDFs go to a
/// sub-directory of `output_dir` named after the file stem, since batch
/// numbering restarts for every file.
pub async fn render_files(
    paths: &[PathBuf],
    config: &RenderConfig,
) -> Result<Vec<(PathBuf, Result<RenderOutput, ZplError>)>, ZplError> {
    let inputs = input::discover_inputs(paths);
    info!("{} input file(s) to render", inputs.len());

    let mut shared = config.clone();
    shared.renderer = Some(resolve_renderer(config)?);
    shared.rate_gate = Some(resolve_gate(config));

    let per_input_dirs = inputs.len() > 1;
    let mut reports = Vec::with_capacity(inputs.len());
    for path in inputs {
        if shared.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            warn!("Cancelled; not rendering {}", path.display());
            break;
        }

        let mut per_file = shared.clone();
        if per_input_dirs {
            per_file.output_dir = config.output_dir.join(file_stem(&path));
        }

        let result = render_file(&path, &per_file).await;
        if let Err(ref e) = result {
            warn!("Render failed for {}: {}", path.display(), e);
        }
        reports.push((path, result));
    }

    Ok(reports)
}

/// Synchronous wrapper around [`render`].
///
/// Creates a temporary tokio runtime internally.
pub fn render_sync(zpl: &str, config: &RenderConfig) -> Result<RenderOutput, ZplError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ZplError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(render(zpl, config))
}

/// Segment and plan without contacting the service.
pub fn inspect(zpl: &str, config: &RenderConfig) -> BatchPlan {
    let labels = segment::split_labels(zpl);
    let batches = batch::plan_batches(&labels, &config.limits);
    BatchPlan {
        total_labels: labels.len(),
        total_bytes: labels.iter().map(|l| l.byte_len()).sum(),
        total_asset_bytes: labels.iter().map(|l| l.asset_bytes()).sum(),
        batches: batches
            .iter()
            .enumerate()
            .map(|(i, b)| b.summary(i + 1))
            .collect(),
    }
}

/// Discover `.txt` inputs under `paths` and plan each without contacting
/// the service.
///
/// An unreadable file is logged and recorded as an `Err` entry; planning
/// continues with the next input.
pub async fn inspect_files(
    paths: &[PathBuf],
    config: &RenderConfig,
) -> Vec<(PathBuf, Result<BatchPlan, ZplError>)> {
    let inputs = input::discover_inputs(paths);
    let mut plans = Vec::with_capacity(inputs.len());
    for path in inputs {
        let plan = match input::read_input(&path).await {
            Ok(zpl) => Ok(inspect(&zpl, config)),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                Err(e)
            }
        };
        plans.push((path, plan));
    }
    plans
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pre-built renderer if configured, otherwise the Labelary HTTP client.
pub(crate) fn resolve_renderer(config: &RenderConfig) -> Result<Arc<dyn LabelRenderer>, ZplError> {
    if let Some(ref renderer) = config.renderer {
        return Ok(Arc::clone(renderer));
    }
    let http = HttpRenderer::new(config)?;
    debug!("Using Labelary endpoint {}", http.endpoint());
    Ok(Arc::new(http))
}

pub(crate) fn notify_complete(config: &RenderConfig, total: usize, succeeded: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(total, succeeded);
    }
}

/// Configured gate if any, otherwise the process-wide one for the interval.
pub(crate) fn resolve_gate(config: &RenderConfig) -> Arc<RateGate> {
    match config.rate_gate {
        Some(ref gate) => Arc::clone(gate),
        None => submit::shared_gate(config.min_interval),
    }
}

/// Submit one batch, write its PDF, and report progress.
///
/// Never returns an error; the outcome is recorded in the `BatchResult`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_batch(
    renderer: &dyn LabelRenderer,
    gate: &RateGate,
    output_dir: &Path,
    date: &str,
    number: usize,
    total: usize,
    batch: &Batch,
    config: &RenderConfig,
) -> BatchResult {
    let started = Instant::now();
    let mut result = BatchResult::planned(&batch.summary(number));

    info!(
        "▶ batch {}/{}: {} labels, {} bytes, ~{} asset bytes",
        number,
        total,
        batch.label_count(),
        batch.byte_len(),
        batch.asset_bytes()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(number, total, batch.label_count(), batch.byte_len());
    }

    let outcome = match submit::submit_batch(renderer, gate, number, batch, config.cancel.as_ref())
        .await
    {
        Ok(artifact) => {
            result.response_bytes = artifact.bytes.len();
            persist::write_artifact(output_dir, date, &artifact).await
        }
        Err(e) => Err(e),
    };
    result.duration_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(path) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_batch_complete(number, total, &path, result.response_bytes);
            }
            result.path = Some(path);
        }
        Err(e) => {
            warn!("{}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_batch_error(number, total, &e.to_string());
            }
            result.error = Some(e);
        }
    }

    result
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspect_plans_without_network() {
        let zpl = "^XA^FDa^FS^XZ^XA^FDb^FS^XZ^XA^GFA,10,10,1,F^FS^XZ";
        let config = RenderConfig::builder().max_labels(2).build().unwrap();
        let plan = inspect(zpl, &config);
        assert_eq!(plan.total_labels, 3);
        assert_eq!(plan.total_bytes, zpl.len());
        assert_eq!(plan.total_asset_bytes, 10);
        assert_eq!(plan.batches.len(), 2);
        assert_eq!(plan.batches[1].first_label, 3);
    }

    #[test]
    fn inspect_empty_input() {
        let plan = inspect("   ", &RenderConfig::default());
        assert_eq!(plan, BatchPlan::default());
    }

    #[tokio::test]
    async fn render_without_labels_is_empty_and_touches_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let out_dir = dir.path().join("labels");
        let config = RenderConfig::builder()
            .output_dir(&out_dir)
            .build()
            .unwrap();
        let out = render("\n\n", &config).await.unwrap();
        assert!(out.files.is_empty());
        assert!(!out_dir.exists());
    }

    #[test]
    fn render_sync_runs_without_a_runtime() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = RenderConfig::builder()
            .output_dir(dir.path())
            .build()
            .unwrap();
        let out = render_sync("", &config).unwrap();
        assert_eq!(out.stats, RenderStats::default());
    }

    #[test]
    fn gate_is_reused_when_configured() {
        let gate = Arc::new(RateGate::new(std::time::Duration::from_millis(5)));
        let config = RenderConfig::builder()
            .rate_gate(Arc::clone(&gate))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&resolve_gate(&config), &gate));
    }

    #[test]
    fn default_gate_is_shared_between_runs() {
        let config = RenderConfig::builder()
            .min_interval(std::time::Duration::from_millis(4_321))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(&resolve_gate(&config), &resolve_gate(&config.clone())));
    }

    #[test]
    fn stem_fallback() {
        assert_eq!(file_stem(Path::new("dir/orders.txt")), "orders");
        assert_eq!(file_stem(Path::new("/")), "input");
    }
}

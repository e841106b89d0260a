//! CLI binary for zpl2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RenderConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use zpl2pdf::{
    inspect, inspect_files, render, render_files, BatchPlan, CancelToken, FailurePolicy, LabelSize,
    PrintDensity, ProgressCallback, RenderConfig, RenderOutput, RenderProgressCallback, ZplError,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one bar per input, one log line per batch.
///
/// The bar is re-armed by every `on_render_start`, so the same callback can
/// be shared by all files of a multi-input run.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Splitting labels…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} batches  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, batch: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&batch))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl RenderProgressCallback for CliProgressCallback {
    fn on_render_start(&self, total_labels: usize, total_batches: usize) {
        self.activate_bar(total_batches);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Rendering {total_labels} labels in {total_batches} batch(es)…"
            ))
        ));
    }

    fn on_batch_start(&self, batch: usize, _total: usize, label_count: usize, _bytes: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(batch, Instant::now());
        }
        self.bar
            .set_message(format!("batch {batch} ({label_count} labels)"));
    }

    fn on_batch_complete(&self, batch: usize, total: usize, path: &Path, bytes: usize) {
        let secs = self.elapsed_secs(batch);
        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {:<12}  {}  {}",
            green("✓"),
            batch,
            total,
            dim(&format!("{bytes:>8} bytes")),
            path.display(),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_error(&self, batch: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(batch);

        // keep one line per batch
        let msg = match error.char_indices().nth(80) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Batch {:>3}/{:<3}  {}  {}",
            red("✗"),
            batch,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_render_complete(&self, total_batches: usize, succeeded: usize) {
        let failed = total_batches.saturating_sub(succeeded);
        let line = if failed == 0 {
            format!(
                "{} {} batch(es) rendered successfully",
                green("✔"),
                bold(&succeeded.to_string())
            )
        } else {
            format!(
                "{} {}/{} batches rendered  ({} not rendered)",
                if failed == total_batches {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&succeeded.to_string()),
                total_batches,
                red(&failed.to_string()),
            )
        };
        self.bar.println(line);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render one export into ./labels
  zpl2pdf shipment.txt

  # Render every .txt under a directory into ./out
  zpl2pdf exports/ -o out

  # Read ZPL from stdin
  cat shipment.txt | zpl2pdf -

  # 2.25x1.25 inch labels at 300 dpi
  zpl2pdf --density 12 --size 2.25x1.25 small.txt

  # Show how the input would be batched, without calling the API
  zpl2pdf --dry-run --json shipment.txt

  # Keep going after a rejected batch
  zpl2pdf --continue-on-error shipment.txt

OUTPUT:
  One PDF per request, named <DD-MM-YYYY>-label-<NNN>.pdf, in the output
  directory. With several input files each file gets its own sub-directory
  named after the file, because numbering restarts at 001 for every file.

LIMITS (Labelary free plan):
  50 labels per request          --max-labels
  ~1 MB request body             --max-bytes       (default 921600)
  3 requests per second          --interval-ms     (default 350)
  Large ~DG / ^GF graphics are weighed by their declared byte counts and
  capped per request with --max-asset-bytes (default 2097152).

ENVIRONMENT VARIABLES:
  ZPL2PDF_BASE_URL        Labelary API root (default https://api.labelary.com)
  ZPL2PDF_OUTPUT_DIR      Output directory
  ZPL2PDF_DENSITY         Print density
  ZPL2PDF_SIZE            Label size in inches
  RUST_LOG                Override log filter (e.g. zpl2pdf=debug)
"#;

/// Render ZPL label files to PDF through the Labelary API.
#[derive(Parser, Debug)]
#[command(
    name = "zpl2pdf",
    version,
    about = "Render ZPL label files to PDF through the Labelary API",
    long_about = "Split ZPL exports into labels, pack them into requests that respect the \
Labelary limits (label count, body size, embedded graphic weight), submit them one at a time \
with rate pacing, and save one PDF per request.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// `.txt` files or directories to render; `-` reads ZPL from stdin.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Directory the PDFs are written to.
    #[arg(short, long, env = "ZPL2PDF_OUTPUT_DIR", default_value = "labels")]
    output_dir: PathBuf,

    /// Labelary API root.
    #[arg(long, env = "ZPL2PDF_BASE_URL", default_value = zpl2pdf::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Print density: 6, 8, 12, 24 dpmm (or 152, 203, 300, 600 dpi).
    #[arg(short, long, env = "ZPL2PDF_DENSITY", default_value = "8dpmm")]
    density: PrintDensity,

    /// Label size in inches, WIDTHxHEIGHT.
    #[arg(short, long, env = "ZPL2PDF_SIZE", default_value = "4x6")]
    size: LabelSize,

    /// Maximum labels per request.
    #[arg(long, env = "ZPL2PDF_MAX_LABELS", default_value_t = 50)]
    max_labels: usize,

    /// Maximum request body bytes (UTF-8).
    #[arg(long, env = "ZPL2PDF_MAX_BYTES", default_value_t = 900 * 1024)]
    max_bytes: usize,

    /// Maximum estimated embedded graphic bytes per request.
    #[arg(long, env = "ZPL2PDF_MAX_ASSET_BYTES", default_value_t = 2 * 1024 * 1024)]
    max_asset_bytes: u64,

    /// Minimum milliseconds between two requests.
    #[arg(long, env = "ZPL2PDF_INTERVAL_MS", default_value_t = 350)]
    interval_ms: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "ZPL2PDF_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Keep submitting the remaining batches after one fails.
    #[arg(long, env = "ZPL2PDF_CONTINUE_ON_ERROR")]
    continue_on_error: bool,

    /// Show the batch plan only; nothing is sent.
    #[arg(long)]
    dry_run: bool,

    /// Print results as JSON.
    #[arg(long, env = "ZPL2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "ZPL2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ZPL2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ZPL2PDF_QUIET")]
    quiet: bool,
}

impl Cli {
    fn reads_stdin(&self) -> bool {
        self.paths.len() == 1 && self.paths[0].as_os_str() == "-"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose brings everything back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let stdin_zpl = if cli.reads_stdin() {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read ZPL from stdin")?;
        Some(buf)
    } else {
        None
    };

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let config = build_config(&cli, None, None)?;
        return dry_run(&cli, stdin_zpl.as_deref(), &config).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{} interrupted, abandoning the current request", cyan("⚠"));
                cancel.cancel();
            }
        });
    }

    let progress = show_progress.then(CliProgressCallback::new_dynamic);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
        Some(cancel),
    )?;

    // ── Run ──────────────────────────────────────────────────────────────
    let reports: Vec<(PathBuf, Result<RenderOutput, ZplError>)> = match stdin_zpl {
        Some(zpl) => vec![(PathBuf::from("-"), render(&zpl, &config).await)],
        None => render_files(&cli.paths, &config)
            .await
            .context("Rendering failed")?,
    };

    if let Some(ref cb) = progress {
        cb.finish();
    }

    if reports.is_empty() {
        anyhow::bail!("No .txt input found in the given paths");
    }

    let failures = reports
        .iter()
        .filter(|(_, r)| match r {
            Ok(out) => out.stats.failed > 0,
            Err(_) => true,
        })
        .count();

    if cli.json {
        print_json_reports(&reports)?;
    } else if !cli.quiet {
        print_summary(&reports);
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} input(s) did not render cleanly", reports.len());
    }
    Ok(())
}

/// Map CLI args to `RenderConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: Option<CancelToken>,
) -> Result<RenderConfig> {
    let mut builder = RenderConfig::builder()
        .base_url(&cli.base_url)
        .density(cli.density)
        .label_size(cli.size)
        .max_labels(cli.max_labels)
        .max_bytes(cli.max_bytes)
        .max_asset_bytes(cli.max_asset_bytes)
        .min_interval(Duration::from_millis(cli.interval_ms))
        .request_timeout_secs(cli.timeout)
        .output_dir(&cli.output_dir)
        .failure_policy(if cli.continue_on_error {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        });

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    if let Some(token) = cancel {
        builder = builder.cancel(token);
    }

    builder.build().context("Invalid configuration")
}

async fn dry_run(cli: &Cli, stdin_zpl: Option<&str>, config: &RenderConfig) -> Result<()> {
    let plans: Vec<(PathBuf, Result<BatchPlan, ZplError>)> = match stdin_zpl {
        Some(zpl) => vec![(PathBuf::from("-"), Ok(inspect(zpl, config)))],
        None => inspect_files(&cli.paths, config).await,
    };

    if cli.json {
        let json: Vec<serde_json::Value> = plans
            .iter()
            .map(|(path, plan)| match plan {
                Ok(plan) => serde_json::json!({ "input": path, "plan": plan }),
                Err(e) => serde_json::json!({ "input": path, "error": e.to_string() }),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise plan")?
        );
        return Ok(());
    }

    for (path, plan) in &plans {
        println!("{}", bold(&path.display().to_string()));
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => {
                println!("  {} {}", red("✘"), e);
                continue;
            }
        };
        println!(
            "  Labels:        {}  ({} bytes, ~{} graphic bytes)",
            plan.total_labels, plan.total_bytes, plan.total_asset_bytes
        );
        println!("  Requests:      {}", plan.batches.len());
        for b in &plan.batches {
            println!(
                "    {:>3}  labels {:>4}..{:<4}  {:>8} bytes  ~{:>8} graphic",
                b.batch,
                b.first_label,
                b.first_label + b.label_count - 1,
                b.bytes,
                b.asset_bytes
            );
        }
    }
    Ok(())
}

fn print_json_reports(reports: &[(PathBuf, Result<RenderOutput, ZplError>)]) -> Result<()> {
    let json: Vec<serde_json::Value> = reports
        .iter()
        .map(|(path, result)| match result {
            Ok(out) => serde_json::json!({ "input": path, "output": out }),
            Err(e) => serde_json::json!({ "input": path, "error": e.to_string() }),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&json).context("Failed to serialise output")?
    );
    Ok(())
}

fn print_summary(reports: &[(PathBuf, Result<RenderOutput, ZplError>)]) {
    for (path, result) in reports {
        let name = path.display().to_string();
        match result {
            Ok(out) if out.stats.total_batches == 0 => {
                eprintln!("{}  {}  {}", dim("–"), name, dim("no labels"));
            }
            Ok(out) => {
                eprintln!(
                    "{}  {}  {}/{} batches  {} labels  {}ms",
                    if out.stats.failed == 0 {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    bold(&name),
                    out.stats.succeeded,
                    out.stats.total_batches,
                    out.stats.total_labels,
                    out.stats.duration_ms,
                );
                for file in &out.files {
                    eprintln!("   → {}", file.display());
                }
            }
            Err(ZplError::BatchFailed { source, written }) => {
                eprintln!("{}  {}  {}", red("✘"), bold(&name), red(&source.to_string()));
                for file in written {
                    eprintln!("   → {}", file.display());
                }
            }
            Err(e) => {
                eprintln!("{}  {}  {}", red("✘"), bold(&name), red(&e.to_string()));
            }
        }
    }
}

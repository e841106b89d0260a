//! # zpl2pdf
//!
//! Render large ZPL label streams to PDF through the
//! [Labelary](https://labelary.com) API.
//!
//! ## Why this crate?
//!
//! Label exports from warehouse and shipping systems routinely hold hundreds
//! of concatenated `^XA…^XZ` labels, many with embedded `^GF` logos. The
//! Labelary API caps each request by label count and body size, chokes on
//! requests carrying too much inflated graphic data, and rate-limits callers.
//! This crate splits the stream into labels, packs them into requests that
//! fit every cap, paces the requests, and writes one PDF per request, in
//! order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ZPL text
//!  │
//!  ├─ 1. Segment   split before every ^XA (leading noise is kept, not lost)
//!  ├─ 2. Estimate  sum declared ~DG / ^GF byte counts per label
//!  ├─ 3. Batch     greedy packing: ≤ 50 labels, ≤ 900 KiB, ≤ 2 MiB graphics
//!  ├─ 4. Submit    one request at a time, ≥ 350 ms apart, no retries
//!  └─ 5. Persist   labels/<DD-MM-YYYY>-label-<NNN>.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zpl2pdf::{render, RenderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let zpl = std::fs::read_to_string("labels.txt")?;
//!     let config = RenderConfig::default();
//!     let output = render(&zpl, &config).await?;
//!     for path in &output.files {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `zpl2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! zpl2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cancel;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cancel::CancelToken;
pub use config::{BatchLimits, FailurePolicy, LabelSize, PrintDensity, RenderConfig, RenderConfigBuilder};
pub use error::{BatchError, ZplError};
pub use output::{BatchPlan, BatchResult, RenderOutput, RenderStats};
pub use pipeline::submit::{HttpRenderer, LabelRenderer, RateGate};
pub use progress::{NoopProgressCallback, ProgressCallback, RenderProgressCallback};
pub use render::{inspect, inspect_files, render, render_file, render_files, render_sync};
pub use stream::{render_stream, BatchStream};

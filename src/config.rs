//! Configuration types for ZPL-to-PDF rendering.
//!
//! All rendering behaviour is controlled through [`RenderConfig`], built via
//! its [`RenderConfigBuilder`]. Every knob lives in one struct so a run can
//! be logged, cloned into a stream, or shared across several inputs.
//!
//! The defaults mirror the Labelary free plan: at most 50 labels and just
//! under 1 MB per request, and no more than roughly three requests per
//! second.

use crate::cancel::CancelToken;
use crate::error::ZplError;
use crate::pipeline::submit::{LabelRenderer, RateGate};
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Public Labelary API root.
pub const DEFAULT_BASE_URL: &str = "https://api.labelary.com";

/// Configuration for a rendering run.
///
/// Built via [`RenderConfig::builder()`] or using [`RenderConfig::default()`].
///
/// # Example
/// ```rust
/// use zpl2pdf::{FailurePolicy, RenderConfig};
///
/// let config = RenderConfig::builder()
///     .label_size("4x6".parse().unwrap())
///     .max_labels(25)
///     .failure_policy(FailurePolicy::Continue)
///     .build()
///     .unwrap();
/// assert_eq!(config.limits.max_labels, 25);
/// ```
#[derive(Clone)]
pub struct RenderConfig {
    /// API root, without the `/v1/...` path. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Print density the labels were designed for. Default: 8 dpmm (203 dpi).
    pub density: PrintDensity,

    /// Physical label size in inches. Default: 4x6.
    pub label_size: LabelSize,

    /// Per-request packing limits.
    pub limits: BatchLimits,

    /// Minimum spacing between two request dispatches. Default: 350 ms.
    ///
    /// Measured from dispatch to dispatch, so a slow response does not let
    /// the next request go out early.
    pub min_interval: Duration,

    /// Per-request HTTP timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Directory the PDFs are written to; created if absent. Default: `labels`.
    pub output_dir: PathBuf,

    /// What to do with the remaining batches after one fails. Default: [`FailurePolicy::Abort`].
    pub failure_policy: FailurePolicy,

    /// Pre-constructed transport. Takes precedence over the built-in HTTP client.
    pub renderer: Option<Arc<dyn LabelRenderer>>,

    /// Explicit pacing gate. When `None`, runs pace through the process-wide
    /// gate for `min_interval` (see [`crate::pipeline::submit::shared_gate`]).
    pub rate_gate: Option<Arc<RateGate>>,

    /// Optional per-batch progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Optional cancellation signal.
    pub cancel: Option<CancelToken>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            density: PrintDensity::default(),
            label_size: LabelSize::default(),
            limits: BatchLimits::default(),
            min_interval: Duration::from_millis(350),
            request_timeout_secs: 30,
            output_dir: PathBuf::from("labels"),
            failure_policy: FailurePolicy::default(),
            renderer: None,
            rate_gate: None,
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("base_url", &self.base_url)
            .field("density", &self.density)
            .field("label_size", &self.label_size)
            .field("limits", &self.limits)
            .field("min_interval", &self.min_interval)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("output_dir", &self.output_dir)
            .field("failure_policy", &self.failure_policy)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn LabelRenderer>"))
            .field("rate_gate", &self.rate_gate.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

impl RenderConfig {
    /// Create a new builder for `RenderConfig`.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full endpoint URL for the configured density and label size.
    ///
    /// ```rust
    /// let config = zpl2pdf::RenderConfig::default();
    /// assert_eq!(
    ///     config.endpoint(),
    ///     "https://api.labelary.com/v1/printers/8dpmm/labels/4x6/"
    /// );
    /// ```
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/printers/{}/labels/{}/",
            self.base_url.trim_end_matches('/'),
            self.density,
            self.label_size
        )
    }
}

/// Builder for [`RenderConfig`].
#[derive(Debug)]
pub struct RenderConfigBuilder {
    config: RenderConfig,
}

impl RenderConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn density(mut self, density: PrintDensity) -> Self {
        self.config.density = density;
        self
    }

    pub fn label_size(mut self, size: LabelSize) -> Self {
        self.config.label_size = size;
        self
    }

    pub fn limits(mut self, limits: BatchLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn max_labels(mut self, n: usize) -> Self {
        self.config.limits.max_labels = n;
        self
    }

    pub fn max_bytes(mut self, n: usize) -> Self {
        self.config.limits.max_bytes = n;
        self
    }

    pub fn max_asset_bytes(mut self, n: u64) -> Self {
        self.config.limits.max_asset_bytes = n;
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.config.min_interval = interval;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn LabelRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn rate_gate(mut self, gate: Arc<RateGate>) -> Self {
        self.config.rate_gate = Some(gate);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.config.cancel = Some(token);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RenderConfig, ZplError> {
        let c = &self.config;
        if c.limits.max_labels == 0 {
            return Err(ZplError::InvalidConfig(
                "max_labels must be ≥ 1".into(),
            ));
        }
        if c.limits.max_bytes == 0 {
            return Err(ZplError::InvalidConfig("max_bytes must be ≥ 1".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(ZplError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(ZplError::InvalidConfig(format!(
                "base URL must be http:// or https://, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Limits ───────────────────────────────────────────────────────────────

/// The three independent bounds a batch is packed against.
///
/// A batch that holds a single label may exceed `max_bytes` or
/// `max_asset_bytes`; it never exceeds `max_labels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLimits {
    /// Labels per request. Default: 50.
    pub max_labels: usize,
    /// UTF-8 payload bytes per request. Default: 900 KiB.
    pub max_bytes: usize,
    /// Estimated embedded graphic bytes per request. Default: 2 MiB.
    pub max_asset_bytes: u64,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_labels: 50,
            max_bytes: 900 * 1024,
            max_asset_bytes: 2 * 1024 * 1024,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Continuation policy after a batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop at the first failed batch and return [`ZplError::BatchFailed`]. (default)
    #[default]
    Abort,
    /// Record the failure and keep submitting the remaining batches.
    Continue,
}

/// Printer resolution, in dots per millimetre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PrintDensity {
    /// 6 dpmm (152 dpi)
    Dpmm6,
    /// 8 dpmm (203 dpi) (default)
    #[default]
    Dpmm8,
    /// 12 dpmm (300 dpi)
    Dpmm12,
    /// 24 dpmm (600 dpi)
    Dpmm24,
}

impl PrintDensity {
    pub fn dpmm(self) -> u32 {
        match self {
            PrintDensity::Dpmm6 => 6,
            PrintDensity::Dpmm8 => 8,
            PrintDensity::Dpmm12 => 12,
            PrintDensity::Dpmm24 => 24,
        }
    }
}

impl fmt::Display for PrintDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}dpmm", self.dpmm())
    }
}

impl FromStr for PrintDensity {
    type Err = ZplError;

    /// Accepts `8dpmm`, `8`, or the matching dpi value (`203dpi`, `203`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let digits = s
            .trim_end_matches("dpmm")
            .trim_end_matches("dpi")
            .trim();
        match digits {
            "6" | "152" => Ok(PrintDensity::Dpmm6),
            "8" | "203" => Ok(PrintDensity::Dpmm8),
            "12" | "300" => Ok(PrintDensity::Dpmm12),
            "24" | "600" => Ok(PrintDensity::Dpmm24),
            _ => Err(ZplError::InvalidConfig(format!(
                "unknown print density '{s}' (expected 6, 8, 12 or 24 dpmm)"
            ))),
        }
    }
}

/// Physical label size in inches, e.g. 4x6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSize {
    pub width: f32,
    pub height: f32,
}

impl Default for LabelSize {
    fn default() -> Self {
        Self {
            width: 4.0,
            height: 6.0,
        }
    }
}

static RE_LABEL_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*[xX×]\s*(\d+(?:\.\d+)?)\s*$").expect("static regex")
});

impl FromStr for LabelSize {
    type Err = ZplError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ZplError::InvalidConfig(format!(
                "invalid label size '{s}' (expected WIDTHxHEIGHT in inches, e.g. 4x6)"
            ))
        };
        let caps = RE_LABEL_SIZE.captures(s).ok_or_else(invalid)?;
        let width: f32 = caps[1].parse().map_err(|_| invalid())?;
        let height: f32 = caps[2].parse().map_err(|_| invalid())?;
        if width <= 0.0 || height <= 0.0 || width > 15.0 || height > 15.0 {
            return Err(ZplError::InvalidConfig(format!(
                "label size {width}x{height} out of range (0 < side ≤ 15 inches)"
            )));
        }
        Ok(LabelSize { width, height })
    }
}

impl fmt::Display for LabelSize {
    /// Whole inches print without a decimal point (`4x6`, `2.25x1.25`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

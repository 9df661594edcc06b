//! Environment-driven logging bootstrap.
//!
//! The library itself only emits `tracing` events (`debug!` around each
//! driver call, `warn!` when an after-hook fails on a committed write). This
//! module installs a subscriber for applications that don't bring their own.
//!
//! # Environment Variables
//!
//! - `MDU_DEBUG=true|1|yes` - Enable debug logging
//! - `MDU_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `MDU_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! mdu::logging::init();
//! ```

use std::env;
use std::sync::Once;

/// Enables debug-level logging when truthy.
pub const ENV_DEBUG: &str = "MDU_DEBUG";
/// Explicit log level.
pub const ENV_LOG_LEVEL: &str = "MDU_LOG_LEVEL";
/// Output format.
pub const ENV_LOG_FORMAT: &str = "MDU_LOG_FORMAT";

static INIT: Once = Once::new();

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line, human oriented.
    Pretty,
    /// Single line.
    Compact,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_lowercase).as_deref() {
            Some("pretty") => Self::Pretty,
            Some("compact") => Self::Compact,
            _ => Self::Json,
        }
    }
}

fn truthy(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

fn parse_level(raw: Option<&str>, debug: bool) -> &'static str {
    match raw.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ if debug => "debug",
        _ => "warn",
    }
}

/// A caller-chosen level; unknown names fall back to "warn".
fn explicit_level(level: &str) -> &'static str {
    parse_level(Some(level), false)
}

/// Whether `MDU_DEBUG` is set to "true", "1" or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    truthy(env::var(ENV_DEBUG).ok().as_deref())
}

/// Level from `MDU_LOG_LEVEL`; "debug" under `MDU_DEBUG`, otherwise "warn".
pub fn log_level() -> &'static str {
    parse_level(env::var(ENV_LOG_LEVEL).ok().as_deref(), is_debug_enabled())
}

/// Format from `MDU_LOG_FORMAT`.
pub fn log_format() -> LogFormat {
    LogFormat::parse(env::var(ENV_LOG_FORMAT).ok().as_deref())
}

/// Install a subscriber if `MDU_DEBUG` or `MDU_LOG_LEVEL` asks for one.
///
/// Only the first call does anything.
pub fn init() {
    if !is_debug_enabled() && env::var(ENV_LOG_LEVEL).is_err() {
        return;
    }
    init_with_level(log_level());
}

/// Install a subscriber at `level` regardless of `MDU_DEBUG`.
///
/// Only the first call to this or [`init`] does anything.
pub fn init_with_level(level: &str) {
    let level = explicit_level(level);
    let format = log_format();

    INIT.call_once(|| install(level, format));
}

#[cfg(feature = "tracing-subscriber")]
fn install(level: &'static str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_new(format!(
        "mdu={level},mdu_mongodb={level},mdu_aggregate={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };

    if installed.is_ok() {
        tracing::info!(level, format = ?format, "mdu logging initialized");
    }
}

#[cfg(not(feature = "tracing-subscriber"))]
fn install(_level: &'static str, _format: LogFormat) {}

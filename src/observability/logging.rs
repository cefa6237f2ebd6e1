//! Structured logging using the tracing crate
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: Log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: Output format (json, pretty, compact) - defaults to json
//! - `LOG_SPANS`: Include span open/close events (true/false) - defaults to false
//! - `RUST_LOG`: Override log filtering entirely
//!
//! ```bash
//! LOG_FORMAT=pretty LOG_LEVEL=DEBUG waste-manager run < items.txt
//! ```

use once_cell::sync::OnceCell;
use std::env;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static LOGGING_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format for structured logging (machine-readable)
    Json,
    /// Pretty format with colors and indentation (human-readable)
    Pretty,
    /// Compact format with colors but minimal spacing (terminal-friendly)
    Compact,
}

impl LogFormat {
    /// Parse log format from string, defaulting to JSON
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Parse a log level name, defaulting to INFO
pub fn parse_level(s: &str) -> Level {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "DEBUG" => Level::DEBUG,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    }
}

fn span_events(include_spans: bool) -> fmt::format::FmtSpan {
    if include_spans {
        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
    } else {
        fmt::format::FmtSpan::NONE
    }
}

/// Initialize logging with manual configuration
///
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_logging(level: Level, format: LogFormat, include_spans: bool) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let filter = match env::var("RUST_LOG") {
            Ok(rust_log) => EnvFilter::new(rust_log),
            Err(_) => EnvFilter::new(level.to_string()),
        };

        let subscriber = tracing_subscriber::registry().with(filter);

        // A subscriber installed elsewhere (e.g. by a test harness) wins.
        let _ = match format {
            LogFormat::Json => subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_span_events(span_events(include_spans)),
                )
                .try_init(),
            LogFormat::Pretty => subscriber
                .with(
                    fmt::layer()
                        .pretty()
                        .with_ansi(true)
                        .with_writer(std::io::stderr)
                        .with_span_events(span_events(include_spans)),
                )
                .try_init(),
            LogFormat::Compact => subscriber
                .with(
                    fmt::layer()
                        .compact()
                        .with_ansi(true)
                        .with_target(false)
                        .with_writer(std::io::stderr)
                        .with_span_events(span_events(include_spans)),
                )
                .try_init(),
        };
    });
}

/// Initialize logging from environment variables
pub fn init_default_logging() {
    let level = parse_level(&env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()));
    let format = LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()));
    let include_spans = env::var("LOG_SPANS")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    init_logging(level, format, include_spans);
}

/// Create a dispatch loop span
#[macro_export]
macro_rules! dispatch_span {
    ($($field:tt)*) => {
        tracing::info_span!("dispatch_loop", $($field)*)
    };
}

/// Create a transform task span
#[macro_export]
macro_rules! transform_span {
    ($($field:tt)*) => {
        tracing::debug_span!("transform_task", $($field)*)
    };
}

pub use {dispatch_span, transform_span};

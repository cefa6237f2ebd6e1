//! Observability: structured logging and pipeline metrics

pub mod logging;
pub mod metrics;

pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{MetricsSnapshot, PipelineMetrics};

pub use logging::{dispatch_span, transform_span};

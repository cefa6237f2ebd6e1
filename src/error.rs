//! Error types for the classify-and-transform pipeline
//!
//! Failures are local to one item: a failed transform occupies its own slot in
//! the output stream and never disturbs the ordering of any other item.

use thiserror::Error;

/// Failure of a single transform invocation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("Transform failed: {message}")]
    Failed { message: String },

    #[error("Transform panicked: {message}")]
    Panicked { message: String },
}

impl TransformError {
    /// Create a transform failure
    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Create a panic marker from a caught panic payload
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        Self::Panicked {
            message: panic_message(payload),
        }
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Errors surfaced by the ordered sequencers
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SequencerError {
    /// Input has ended and every queued value has been delivered
    #[error("Sequencer closed")]
    Closed,

    /// The writer of a pending result went away without resolving it
    #[error("Pending result {sequence} was dropped before it resolved")]
    Abandoned { sequence: u64 },
}

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline closed")]
    Closed,

    #[error("Item {sequence} failed to transform: {source}")]
    TransformFailed {
        sequence: u64,
        #[source]
        source: TransformError,
    },

    #[error("Item {sequence} was abandoned before its transform resolved")]
    Abandoned { sequence: u64 },

    #[error("Configuration swap was not acknowledged by the dispatch loop")]
    SwapRejected,

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl PipelineError {
    /// Create a transform failure for the given item
    pub fn transform_failed(sequence: u64, source: TransformError) -> Self {
        Self::TransformFailed { sequence, source }
    }

    /// Whether this error ends the stream rather than describing one slot
    pub fn is_closed(&self) -> bool {
        matches!(self, PipelineError::Closed)
    }
}

impl From<SequencerError> for PipelineError {
    fn from(err: SequencerError) -> Self {
        match err {
            SequencerError::Closed => PipelineError::Closed,
            SequencerError::Abandoned { sequence } => PipelineError::Abandoned { sequence },
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

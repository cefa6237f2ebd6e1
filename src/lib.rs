//! Waste Manager
//!
//! A reconfigurable, order-preserving concurrent classify-and-transform
//! pipeline.
//!
//! # Overview
//!
//! Items are submitted one at a time. A pluggable classifier marks each one as
//! recyclable or waste. Recyclable items are transformed concurrently by a
//! pluggable (possibly slow) transformer; waste items leave immediately as a
//! waste value. Both output streams preserve submission order even though
//! transforms complete out of order, and the classifier and transformer can be
//! swapped at runtime without touching items already dispatched.
//!
//! # Quick Start
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use waste_manager::rules::{PrefixClassifier, TemplateTransformer};
//! use waste_manager::WasteManager;
//!
//! let manager = WasteManager::new(PrefixClassifier::default(), TemplateTransformer::default());
//!
//! manager.submit("scrap1".to_string()).unwrap();
//! manager.submit("waste1".to_string()).unwrap();
//!
//! assert_eq!(manager.next_output().await.unwrap(), "recycled goods from scrap1");
//! assert_eq!(manager.next_waste().await.unwrap(), "waste1");
//! # });
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod observability;
pub mod pipeline;
pub mod rules;

pub use config::{ConfigError, PipelineConfig};
pub use error::{PipelineError, PipelineResult, SequencerError, TransformError};
pub use manager::{Intake, OutputStream, WasteManager, WasteStream};
pub use pipeline::{infallible, Classification, Classifier, ResultSequencer, Transformer};

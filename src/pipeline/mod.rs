//! Order-preserving classify-and-transform pipeline
//!
//! Components, leaves first:
//! - [`classify`]: pluggable recyclability predicate
//! - [`transform`]: pluggable transform function and its per-item task
//! - [`pending`]: single-assignment handles for in-flight transforms
//! - [`sequencer`]: ordered queue of pending results (FIFO delivery
//!   regardless of completion order)
//! - [`waste`]: FIFO for waste values
//! - [`dispatch`]: the loop that classifies, routes and applies hot swaps

pub mod classify;
pub mod dispatch;
pub mod pending;
pub mod sequencer;
pub mod transform;
pub mod waste;

pub use classify::{Classification, Classifier};
pub use pending::{pending, PendingResult, Resolver};
pub use sequencer::{ResultSequencer, SequencerInput, SequencerOutput};
pub use transform::{infallible, Infallible, SharedTransformer, TransformOutcome, Transformer};
pub use waste::{WasteInput, WasteOutput, WasteSequencer};

//! Transform stage
//!
//! Each recyclable item gets its own transform task on the blocking pool,
//! carrying the transformer that was current when the item was dispatched.
//! The task always resolves its handle: a returned error or a panic becomes a
//! `TransformError` in that item's slot.

use crate::error::TransformError;
use crate::observability::metrics::PipelineMetrics;
use crate::pipeline::pending::Resolver;
use crate::transform_span;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Result of one transform invocation
pub type TransformOutcome<O> = Result<O, TransformError>;

/// Pluggable, possibly slow transform function
///
/// Invocations run concurrently with each other, including invocations of
/// transformers that were swapped out or in while earlier items were in flight.
pub trait Transformer<I, O>: Send + Sync + 'static {
    fn transform(&self, item: I) -> TransformOutcome<O>;
}

impl<I, O, F> Transformer<I, O> for F
where
    F: Fn(I) -> TransformOutcome<O> + Send + Sync + 'static,
{
    fn transform(&self, item: I) -> TransformOutcome<O> {
        self(item)
    }
}

/// Adapter for transform functions that cannot fail
#[derive(Debug, Clone, Copy)]
pub struct Infallible<F>(F);

/// Wrap a plain `Fn(I) -> O` as a `Transformer`
pub fn infallible<F>(f: F) -> Infallible<F> {
    Infallible(f)
}

impl<I, O, F> Transformer<I, O> for Infallible<F>
where
    F: Fn(I) -> O + Send + Sync + 'static,
{
    fn transform(&self, item: I) -> TransformOutcome<O> {
        Ok((self.0)(item))
    }
}

/// Shared handle to a transformer, cloned into every transform task
pub type SharedTransformer<I, O> = Arc<dyn Transformer<I, O>>;

/// Start one transform task for `item`
///
/// `transformer` is the snapshot captured at dispatch time; later swaps do not
/// affect this task.
pub fn spawn_transform<I, O>(
    item: I,
    transformer: SharedTransformer<I, O>,
    resolver: Resolver<TransformOutcome<O>>,
    metrics: Arc<PipelineMetrics>,
) -> JoinHandle<()>
where
    I: Send + 'static,
    O: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let sequence = resolver.sequence();
        let _span = transform_span!(sequence).entered();
        metrics.transform_started();
        let started = Instant::now();

        let outcome = run_transform(transformer.as_ref(), item);
        let elapsed = started.elapsed();

        match &outcome {
            Ok(_) => {
                debug!(
                    sequence,
                    elapsed_us = elapsed.as_micros() as u64,
                    "Transform completed"
                );
                metrics.transform_completed(elapsed);
            }
            Err(e) => {
                warn!(sequence, error = %e, "Transform failed");
                metrics.transform_failed(elapsed);
            }
        }

        resolver.resolve(outcome);
    })
}

/// Invoke the transformer, converting a panic into a failure marker
pub fn run_transform<I, O>(transformer: &dyn Transformer<I, O>, item: I) -> TransformOutcome<O>
where
    I: 'static,
    O: 'static,
{
    panic::catch_unwind(AssertUnwindSafe(|| transformer.transform(item)))
        .unwrap_or_else(|payload| Err(TransformError::panicked(payload.as_ref())))
}

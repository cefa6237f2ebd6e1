//! Public facade over the classify-and-transform pipeline
//!
//! A `WasteManager` owns the intake side (submit and hot swaps) and the two
//! ordered output streams. It can be used as a whole through `&self`, or split
//! with [`WasteManager::into_parts`] so producers and consumers live on
//! different tasks. Dropping every [`Intake`] ends the input: both streams then
//! deliver everything already dispatched and report [`PipelineError::Closed`].
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use waste_manager::{infallible, Classification, WasteManager};
//!
//! let manager = WasteManager::new(
//!     |item: &String| {
//!         if item.starts_with("waste") {
//!             Classification::Waste(item.clone())
//!         } else {
//!             Classification::Recyclable
//!         }
//!     },
//!     infallible(|item: String| format!("recycled goods from {item}")),
//! );
//!
//! manager.submit("good1".to_string()).unwrap();
//! manager.submit("waste1".to_string()).unwrap();
//!
//! assert_eq!(manager.next_output().await.unwrap(), "recycled goods from good1");
//! assert_eq!(manager.next_waste().await.unwrap(), "waste1");
//! # });
//! ```

use crate::error::{PipelineError, PipelineResult};
use crate::observability::metrics::PipelineMetrics;
use crate::pipeline::classify::Classifier;
use crate::pipeline::dispatch::{Command, DispatchLoop};
use crate::pipeline::sequencer::{ResultSequencer, SequencerOutput};
use crate::pipeline::transform::{Transformer, TransformOutcome};
use crate::pipeline::waste::{WasteOutput, WasteSequencer};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;
use uuid::Uuid;

/// Reconfigurable, order-preserving classify-and-transform pipeline
pub struct WasteManager<I, W, O> {
    intake: Intake<I, W, O>,
    outputs: OutputStream<O>,
    waste: WasteStream<W>,
}

impl<I, W, O> WasteManager<I, W, O>
where
    I: Send + 'static,
    W: Send + 'static,
    O: Send + 'static,
{
    /// Create a manager and start its dispatch loop on the current runtime
    pub fn new<C, T>(classifier: C, transformer: T) -> Self
    where
        C: Classifier<I, W>,
        T: Transformer<I, O>,
    {
        Self::with_metrics(classifier, transformer, Arc::new(PipelineMetrics::new()))
    }

    /// Create a manager that records into the given metrics collector
    pub fn with_metrics<C, T>(classifier: C, transformer: T, metrics: Arc<PipelineMetrics>) -> Self
    where
        C: Classifier<I, W>,
        T: Transformer<I, O>,
    {
        let id = Uuid::new_v4();
        let (results_in, results_out) = ResultSequencer::new().split();
        let (waste_in, waste_out) = WasteSequencer::new().split();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let dispatch = DispatchLoop::new(
            id,
            Box::new(classifier),
            Arc::new(transformer),
            results_in,
            waste_in,
            Arc::clone(&metrics),
        );
        tokio::spawn(dispatch.run(commands_rx));

        info!(pipeline_id = %id, "Waste manager created");

        Self {
            intake: Intake {
                id,
                commands: commands_tx,
                metrics: Arc::clone(&metrics),
            },
            outputs: OutputStream {
                results: results_out,
                metrics: Arc::clone(&metrics),
            },
            waste: WasteStream {
                values: waste_out,
                metrics,
            },
        }
    }
}

impl<I, W, O> WasteManager<I, W, O> {
    pub fn id(&self) -> Uuid {
        self.intake.id
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.intake.metrics
    }

    /// Enqueue an item for dispatch. Never waits.
    pub fn submit(&self, item: I) -> PipelineResult<()> {
        self.intake.submit(item)
    }

    /// Replace the classifier for every item submitted after this returns
    pub async fn set_classifier<C>(&self, classifier: C) -> PipelineResult<()>
    where
        C: Classifier<I, W>,
    {
        self.intake.set_classifier(classifier).await
    }

    /// Replace the transformer for every item submitted after this returns
    pub async fn set_transformer<T>(&self, transformer: T) -> PipelineResult<()>
    where
        T: Transformer<I, O>,
    {
        self.intake.set_transformer(transformer).await
    }

    /// Next transformed output in submission order
    pub async fn next_output(&self) -> PipelineResult<O> {
        self.outputs.next().await
    }

    /// Next waste value in submission order
    pub async fn next_waste(&self) -> PipelineResult<W> {
        self.waste.next().await
    }

    /// Split into independently owned intake and output halves
    pub fn into_parts(self) -> (Intake<I, W, O>, OutputStream<O>, WasteStream<W>) {
        (self.intake, self.outputs, self.waste)
    }
}

/// Submission and reconfiguration handle
///
/// Clones share the same dispatch loop. Commands from one handle are applied
/// in the order they were issued.
pub struct Intake<I, W, O> {
    id: Uuid,
    commands: mpsc::UnboundedSender<Command<I, W, O>>,
    metrics: Arc<PipelineMetrics>,
}

impl<I, W, O> Clone for Intake<I, W, O> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            commands: self.commands.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<I, W, O> Intake<I, W, O> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn submit(&self, item: I) -> PipelineResult<()> {
        self.commands
            .send(Command::Submit(item))
            .map_err(|_| PipelineError::Closed)?;
        self.metrics.item_submitted();
        Ok(())
    }

    /// Hand a new classifier to the dispatch loop and wait until it is applied
    pub async fn set_classifier<C>(&self, classifier: C) -> PipelineResult<()>
    where
        C: Classifier<I, W>,
    {
        let (ack, acked) = oneshot::channel();
        self.send_swap(Command::SetClassifier {
            classifier: Box::new(classifier),
            ack,
        })?;
        acked.await.map_err(|_| PipelineError::SwapRejected)
    }

    /// Hand a new transformer to the dispatch loop and wait until it is applied
    pub async fn set_transformer<T>(&self, transformer: T) -> PipelineResult<()>
    where
        T: Transformer<I, O>,
    {
        let (ack, acked) = oneshot::channel();
        self.send_swap(Command::SetTransformer {
            transformer: Arc::new(transformer),
            ack,
        })?;
        acked.await.map_err(|_| PipelineError::SwapRejected)
    }

    fn send_swap(&self, command: Command<I, W, O>) -> PipelineResult<()> {
        self.commands
            .send(command)
            .map_err(|_| PipelineError::Closed)
    }
}

/// Ordered stream of transform outputs
pub struct OutputStream<O> {
    results: SequencerOutput<TransformOutcome<O>>,
    metrics: Arc<PipelineMetrics>,
}

impl<O> OutputStream<O> {
    /// Wait for the next output in submission order
    ///
    /// A failed transform yields `PipelineError::TransformFailed` for its own
    /// slot; the following call moves on to the next item.
    pub async fn next(&self) -> PipelineResult<O> {
        let (sequence, outcome) = self.results.next_with_sequence().await?;
        self.metrics.output_delivered();
        outcome.map_err(|source| PipelineError::transform_failed(sequence, source))
    }
}

/// Ordered stream of waste values
pub struct WasteStream<W> {
    values: WasteOutput<W>,
    metrics: Arc<PipelineMetrics>,
}

impl<W> WasteStream<W> {
    /// Wait for the next waste value in submission order
    pub async fn next(&self) -> PipelineResult<W> {
        let waste = self.values.next().await?;
        self.metrics.waste_delivered();
        Ok(waste)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::pipeline::classify::Classification;
    use crate::pipeline::transform::infallible;

    fn numbers() -> WasteManager<i64, i64, i64> {
        WasteManager::new(
            |n: &i64| -> Classification<i64> { (*n >= 0, -*n).into() },
            infallible(|n: i64| n * 2),
        )
    }

    #[tokio::test]
    async fn test_submit_and_pull_both_streams() {
        let manager = numbers();
        manager.submit(1).unwrap();
        manager.submit(-2).unwrap();
        manager.submit(3).unwrap();

        assert_eq!(manager.next_output().await.unwrap(), 2);
        assert_eq!(manager.next_output().await.unwrap(), 6);
        assert_eq!(manager.next_waste().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_transform_occupies_its_own_slot() {
        let manager: WasteManager<i64, i64, i64> = WasteManager::new(
            |_: &i64| Classification::Recyclable,
            |n: i64| -> TransformOutcome<i64> {
                if n == 13 {
                    Err(TransformError::failed("unlucky"))
                } else {
                    Ok(n)
                }
            },
        );
        for n in [12, 13, 14] {
            manager.submit(n).unwrap();
        }

        assert_eq!(manager.next_output().await.unwrap(), 12);
        match manager.next_output().await {
            Err(PipelineError::TransformFailed { sequence, source }) => {
                assert_eq!(sequence, 1);
                assert_eq!(source, TransformError::failed("unlucky"));
            }
            other => panic!("expected transform failure, got {other:?}"),
        }
        assert_eq!(manager.next_output().await.unwrap(), 14);
    }

    #[tokio::test]
    async fn test_into_parts_closes_after_intake_dropped() {
        let (intake, outputs, waste) = numbers().into_parts();
        intake.submit(5).unwrap();
        intake.submit(-5).unwrap();
        drop(intake);

        assert_eq!(outputs.next().await.unwrap(), 10);
        assert!(outputs.next().await.unwrap_err().is_closed());
        assert_eq!(waste.next().await.unwrap(), 5);
        assert!(waste.next().await.unwrap_err().is_closed());
    }

    #[tokio::test]
    async fn test_cloned_intake_keeps_pipeline_open() {
        let (intake, outputs, _waste) = numbers().into_parts();
        let second = intake.clone();
        assert_eq!(second.id(), intake.id());
        drop(intake);

        second.submit(21).unwrap();
        assert_eq!(outputs.next().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_metrics_track_delivery() {
        let manager = numbers();
        manager.submit(1).unwrap();
        manager.submit(-1).unwrap();
        manager.next_output().await.unwrap();
        manager.next_waste().await.unwrap();

        let snapshot = manager.metrics().snapshot();
        assert_eq!(snapshot.intake.items_submitted, 2);
        assert_eq!(snapshot.intake.waste_emitted, 1);
        assert_eq!(snapshot.delivery.outputs_delivered, 1);
        assert_eq!(snapshot.delivery.waste_delivered, 1);
    }

    #[tokio::test]
    async fn test_swaps_are_acknowledged_and_counted() {
        let manager = numbers();
        manager
            .set_classifier(|_: &i64| Classification::Waste(0))
            .await
            .unwrap();
        manager.set_transformer(infallible(|n: i64| n)).await.unwrap();

        let snapshot = manager.metrics().snapshot();
        assert_eq!(snapshot.swaps.classifier, 1);
        assert_eq!(snapshot.swaps.transformer, 1);
    }
}

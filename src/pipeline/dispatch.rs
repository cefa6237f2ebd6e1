//! Dispatch loop
//!
//! The single coordination point of the pipeline. It owns the current
//! classifier and transformer outright, so swapping either one is a plain
//! assignment between two commands. Every command (item or swap) arrives on one
//! FIFO channel, which is what orders a caller's submit/swap/submit sequence.

use crate::dispatch_span;
use crate::observability::metrics::PipelineMetrics;
use crate::pipeline::classify::{try_classify, Classification, Classifier};
use crate::pipeline::pending::pending;
use crate::pipeline::sequencer::SequencerInput;
use crate::pipeline::transform::{spawn_transform, SharedTransformer, TransformOutcome};
use crate::pipeline::waste::WasteInput;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, Instrument};
use uuid::Uuid;

/// Messages accepted by the dispatch loop
pub enum Command<I, W, O> {
    Submit(I),
    SetClassifier {
        classifier: Box<dyn Classifier<I, W>>,
        ack: oneshot::Sender<()>,
    },
    SetTransformer {
        transformer: SharedTransformer<I, O>,
        ack: oneshot::Sender<()>,
    },
}

impl<I, W, O> std::fmt::Debug for Command<I, W, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Submit(_) => f.write_str("Submit"),
            Command::SetClassifier { .. } => f.write_str("SetClassifier"),
            Command::SetTransformer { .. } => f.write_str("SetTransformer"),
        }
    }
}

pub struct DispatchLoop<I, W, O> {
    pipeline_id: Uuid,
    classifier: Box<dyn Classifier<I, W>>,
    transformer: SharedTransformer<I, O>,
    results: SequencerInput<TransformOutcome<O>>,
    waste: WasteInput<W>,
    metrics: Arc<PipelineMetrics>,
    next_sequence: u64,
}

impl<I, W, O> DispatchLoop<I, W, O>
where
    I: Send + 'static,
    W: Send + 'static,
    O: Send + 'static,
{
    pub fn new(
        pipeline_id: Uuid,
        classifier: Box<dyn Classifier<I, W>>,
        transformer: SharedTransformer<I, O>,
        results: SequencerInput<TransformOutcome<O>>,
        waste: WasteInput<W>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            pipeline_id,
            classifier,
            transformer,
            results,
            waste,
            metrics,
            next_sequence: 0,
        }
    }

    /// Process commands until every sender is dropped
    ///
    /// Returning drops this loop's sequencer inputs, so consumers drain what
    /// was already dispatched and then observe the end of both streams.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command<I, W, O>>) {
        let span = dispatch_span!(pipeline_id = %self.pipeline_id);

        async move {
            info!("Dispatch loop started");

            while let Some(command) = commands.recv().await {
                self.handle(command);
            }

            info!(
                items_dispatched = self.next_sequence,
                "Intake closed, dispatch loop stopped"
            );
        }
        .instrument(span)
        .await
    }

    /// Apply one command
    pub fn handle(&mut self, command: Command<I, W, O>) {
        match command {
            Command::Submit(item) => self.dispatch(item),
            Command::SetClassifier { classifier, ack } => {
                self.classifier = classifier;
                self.metrics.classifier_swapped();
                info!(
                    effective_from = self.next_sequence,
                    "Classifier replaced"
                );
                let _ = ack.send(());
            }
            Command::SetTransformer { transformer, ack } => {
                self.transformer = transformer;
                self.metrics.transformer_swapped();
                info!(
                    effective_from = self.next_sequence,
                    "Transformer replaced"
                );
                let _ = ack.send(());
            }
        }
    }

    fn dispatch(&mut self, item: I) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.metrics.item_dispatched();

        let classification = match try_classify(self.classifier.as_ref(), &item) {
            Ok(classification) => classification,
            Err(message) => {
                error!(sequence, panic = %message, "Classifier panicked, aborting");
                std::process::abort();
            }
        };

        match classification {
            Classification::Waste(waste) => {
                trace!(sequence, "Item classified as waste");
                self.metrics.waste_emitted();
                if self.waste.push(waste).is_err() {
                    debug!(sequence, "Waste consumer gone, dropping waste value");
                }
            }
            Classification::Recyclable => {
                trace!(sequence, "Item classified as recyclable");
                let (resolver, handle) = pending(sequence);
                if self.results.enqueue(handle).is_err() {
                    debug!(sequence, "Result consumer gone, skipping transform");
                    return;
                }
                spawn_transform(
                    item,
                    Arc::clone(&self.transformer),
                    resolver,
                    Arc::clone(&self.metrics),
                );
            }
        }
    }
}

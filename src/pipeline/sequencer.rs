//! Ordered queue of pending results
//!
//! Handles are appended in submission order and may resolve in any order.
//! A dedicated task awaits only the current head, forwards its value, then
//! moves on to the next handle. Appending never waits on resolution, so new
//! work keeps flowing in while a slow head holds back delivery.
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use waste_manager::pipeline::pending::pending;
//! use waste_manager::pipeline::sequencer::ResultSequencer;
//!
//! let sequencer = ResultSequencer::new();
//! let (first, first_pending) = pending(0);
//! let (second, second_pending) = pending(1);
//! sequencer.enqueue(first_pending).unwrap();
//! sequencer.enqueue(second_pending).unwrap();
//!
//! second.resolve("b");
//! first.resolve("a");
//!
//! assert_eq!(sequencer.next().await, Ok("a"));
//! assert_eq!(sequencer.next().await, Ok("b"));
//! # });
//! ```

use crate::error::SequencerError;
use crate::pipeline::pending::PendingResult;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

/// Ordered-queue-of-futures with FIFO delivery independent of completion order
pub struct ResultSequencer<T> {
    input: SequencerInput<T>,
    output: SequencerOutput<T>,
}

impl<T: Send + 'static> ResultSequencer<T> {
    /// Create a sequencer and spawn its delivery task on the current runtime
    pub fn new() -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_sequencer(pending_rx, ready_tx));

        Self {
            input: SequencerInput { tx: pending_tx },
            output: SequencerOutput {
                rx: Mutex::new(ready_rx),
            },
        }
    }
}

impl<T: Send + 'static> Default for ResultSequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultSequencer<T> {
    pub fn enqueue(&self, handle: PendingResult<T>) -> Result<(), SequencerError> {
        self.input.enqueue(handle)
    }

    pub async fn next(&self) -> Result<T, SequencerError> {
        self.output.next().await
    }

    /// Split into the producer and consumer halves. Once every input half
    /// is dropped the consumer drains the remaining values then sees `Closed`.
    pub fn split(self) -> (SequencerInput<T>, SequencerOutput<T>) {
        (self.input, self.output)
    }
}

/// Producer half of a `ResultSequencer`
#[derive(Debug)]
pub struct SequencerInput<T> {
    tx: mpsc::UnboundedSender<PendingResult<T>>,
}

impl<T> Clone for SequencerInput<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> SequencerInput<T> {
    /// Append a handle behind every handle enqueued before it. Never waits.
    pub fn enqueue(&self, handle: PendingResult<T>) -> Result<(), SequencerError> {
        self.tx.send(handle).map_err(|_| SequencerError::Closed)
    }
}

/// Consumer half of a `ResultSequencer`
#[derive(Debug)]
pub struct SequencerOutput<T> {
    rx: Mutex<mpsc::UnboundedReceiver<Sequenced<T>>>,
}

/// A delivered slot: the sequence number of its handle and the resolved value
type Sequenced<T> = (u64, Result<T, SequencerError>);

impl<T> SequencerOutput<T> {
    /// Wait for the next value in enqueue order
    ///
    /// Concurrent callers are served one at a time and each receives a
    /// distinct slot.
    pub async fn next(&self) -> Result<T, SequencerError> {
        self.next_with_sequence().await.map(|(_, value)| value)
    }

    /// Like `next`, also returning the sequence number the slot was created with
    pub async fn next_with_sequence(&self) -> Result<(u64, T), SequencerError> {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some((sequence, value)) => value.map(|v| (sequence, v)),
            None => Err(SequencerError::Closed),
        }
    }
}

async fn run_sequencer<T>(
    mut pending: mpsc::UnboundedReceiver<PendingResult<T>>,
    ready: mpsc::UnboundedSender<Sequenced<T>>,
) {
    while let Some(head) = pending.recv().await {
        let sequence = head.sequence();
        trace!(sequence, "Awaiting head of result queue");

        let value = head.wait().await;
        if ready.send((sequence, value)).is_err() {
            debug!(sequence, "Result consumer dropped, stopping sequencer");
            return;
        }
    }
    debug!("Result sequencer input closed, all results delivered");
}

//! Single-assignment pending result handles
//!
//! A `Resolver` is written exactly once by the transform task that owns it;
//! the matching `PendingResult` is held by the result sequencer until it is
//! the head of the queue.

use crate::error::SequencerError;
use tokio::sync::oneshot;

/// Create a linked resolver/pending pair for the item with this sequence number
pub fn pending<T>(sequence: u64) -> (Resolver<T>, PendingResult<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Resolver { sequence, tx },
        PendingResult { sequence, rx },
    )
}

/// Write side of a pending result. Consumed on resolve.
#[derive(Debug)]
pub struct Resolver<T> {
    sequence: u64,
    tx: oneshot::Sender<T>,
}

impl<T> Resolver<T> {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Resolve the handle. A reader that has already gone away is not an error
    /// for the writer; the value is simply dropped.
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(value);
    }
}

/// Read side of a pending result
#[derive(Debug)]
pub struct PendingResult<T> {
    sequence: u64,
    rx: oneshot::Receiver<T>,
}

impl<T> PendingResult<T> {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wait for the value. Fails with `Abandoned` if the resolver was dropped
    /// unresolved, so a lost writer can never stall the reader.
    pub async fn wait(self) -> Result<T, SequencerError> {
        let sequence = self.sequence;
        self.rx
            .await
            .map_err(|_| SequencerError::Abandoned { sequence })
    }

    /// Build an already-resolved handle
    pub fn ready(sequence: u64, value: T) -> Self {
        let (resolver, handle) = pending(sequence);
        resolver.resolve(value);
        handle
    }
}

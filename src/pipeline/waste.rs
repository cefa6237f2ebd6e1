//! Waste value FIFO
//!
//! Waste values are fully computed when they are pushed, so an unbounded
//! channel is the whole buffer: one producer (the dispatch loop), one ordered
//! consumer side.

use crate::error::SequencerError;
use tokio::sync::{mpsc, Mutex};

pub struct WasteSequencer<W> {
    input: WasteInput<W>,
    output: WasteOutput<W>,
}

impl<W> WasteSequencer<W> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            input: WasteInput { tx },
            output: WasteOutput { rx: Mutex::new(rx) },
        }
    }

    pub fn push(&self, waste: W) -> Result<(), SequencerError> {
        self.input.push(waste)
    }

    pub async fn next(&self) -> Result<W, SequencerError> {
        self.output.next().await
    }

    pub fn split(self) -> (WasteInput<W>, WasteOutput<W>) {
        (self.input, self.output)
    }
}

impl<W> Default for WasteSequencer<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct WasteInput<W> {
    tx: mpsc::UnboundedSender<W>,
}

impl<W> Clone for WasteInput<W> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<W> WasteInput<W> {
    pub fn push(&self, waste: W) -> Result<(), SequencerError> {
        self.tx.send(waste).map_err(|_| SequencerError::Closed)
    }
}

#[derive(Debug)]
pub struct WasteOutput<W> {
    rx: Mutex<mpsc::UnboundedReceiver<W>>,
}

impl<W> WasteOutput<W> {
    /// Wait for the next waste value in push order
    pub async fn next(&self) -> Result<W, SequencerError> {
        self.rx.lock().await.recv().await.ok_or(SequencerError::Closed)
    }
}

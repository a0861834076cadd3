//! Background prediction worker.
//!
//! Runs one submission on its own thread so an interactive caller can keep
//! polling for input while the HTTP request is in flight.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::application::PredictionService;
use crate::domain::{ClinicalInput, PredictionRecord};
use crate::ports::PredictionApi;

/// Progress updates from the prediction worker.
#[derive(Debug, Clone)]
pub enum PredictionProgress {
    /// Request sent, waiting for the service
    Submitting,
    /// Prediction recorded in history
    Complete(PredictionRecord),
    /// Request failed; history unchanged. Carries the user-facing message.
    Failed(String),
}

impl PredictionProgress {
    /// Whether no further updates will follow.
    #[must_use]
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Submitting)
    }
}

/// Handle to a running prediction worker.
pub struct PredictionWorkerHandle {
    /// Receiver for progress updates
    pub progress_rx: Receiver<PredictionProgress>,
    /// Thread handle (for joining)
    _handle: JoinHandle<()>,
}

impl PredictionWorkerHandle {
    /// Wait up to `timeout` for the next update.
    ///
    /// `None` means nothing arrived in time. A worker that exits without a
    /// final update yields `Failed`.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PredictionProgress> {
        match self.progress_rx.recv_timeout(timeout) {
            Ok(progress) => Some(progress),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(stopped()),
        }
    }

    /// Block until the final update.
    ///
    /// Returns `Failed` if the worker exits without reporting one.
    #[must_use]
    pub fn wait(self) -> PredictionProgress {
        while let Ok(progress) = self.progress_rx.recv() {
            if progress.is_final() {
                return progress;
            }
        }
        stopped()
    }
}

fn stopped() -> PredictionProgress {
    PredictionProgress::Failed("Prediction worker stopped unexpectedly".to_string())
}

/// Prediction worker that runs a submission in background.
pub struct PredictionWorker;

impl PredictionWorker {
    /// Spawn a background prediction task.
    ///
    /// Returns a handle to receive progress updates.
    pub fn spawn<A>(service: Arc<PredictionService<A>>, input: ClinicalInput) -> PredictionWorkerHandle
    where
        A: PredictionApi + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_with_progress(&service, input, &tx);
        });

        PredictionWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_with_progress<A>(
        service: &PredictionService<A>,
        input: ClinicalInput,
        tx: &Sender<PredictionProgress>,
    ) where
        A: PredictionApi,
    {
        // Receiver may be gone if the caller stopped waiting
        let _ = tx.send(PredictionProgress::Submitting);

        let progress = match service.submit_input(input) {
            Ok(record) => PredictionProgress::Complete(record),
            Err(e) => PredictionProgress::Failed(e.user_message()),
        };
        let _ = tx.send(progress);
    }
}

//! # Print Dispatch
//!
//! Sends one raster job to a device once per requested copy.
//!
//! ```text
//!  copy 1 ──send──► ok
//!         400 ms
//!  copy 2 ──send──► device error   (logged, recorded, batch continues)
//!         400 ms
//!  copy 3 ──send──► ok
//! ```
//!
//! A [`Printer`] owns its sink behind a mutex that is held for the whole
//! batch, so two requests sharing one printer never interleave their copies.
//! Failed copies are not retried.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::error::LabelError;
use crate::protocol::RasterJob;
use crate::request::Quantity;
use crate::transport::RasterSink;

/// Pause between consecutive copies.
pub const DEFAULT_PACING: Duration = Duration::from_millis(400);

/// Upper bound on outcome slots reserved before a batch starts.
const PREALLOCATED_OUTCOMES: u32 = 64;

/// Result of one copy.
#[derive(Debug)]
pub struct CopyOutcome {
    /// 1-based copy number
    pub copy: u32,
    pub result: Result<(), LabelError>,
}

/// Per-copy results of one batch.
#[derive(Debug)]
pub struct PrintReport {
    pub device: String,
    pub requested: u32,
    pub outcomes: Vec<CopyOutcome>,
}

impl PrintReport {
    /// Send attempts made.
    pub fn attempts(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempts() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn first_error(&self) -> Option<&LabelError> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }
}

/// A physical (or simulated) label printer.
#[derive(Debug)]
pub struct Printer<S: RasterSink> {
    sink: Mutex<S>,
    pacing: Duration,
}

impl<S: RasterSink> Printer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Mutex::new(sink),
            pacing: DEFAULT_PACING,
        }
    }

    /// Set the pause between copies. Default is 400ms.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    pub fn describe(&self) -> String {
        match self.sink.lock() {
            Ok(sink) => sink.describe(),
            Err(poisoned) => poisoned.into_inner().describe(),
        }
    }

    /// Send `job` exactly `quantity` times, best effort.
    pub fn print(&self, job: &RasterJob, quantity: Quantity) -> PrintReport {
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let device = sink.describe();
        let requested = quantity.get();
        let mut outcomes = Vec::with_capacity(outcome_capacity(quantity));

        tracing::info!(
            %device,
            copies = requested,
            bytes = job.instructions.len(),
            "printing label"
        );

        for copy in 1..=requested {
            if copy > 1 && !self.pacing.is_zero() {
                thread::sleep(self.pacing);
            }

            let result = sink.send(&job.instructions);
            match &result {
                Ok(()) => tracing::debug!(%device, copy, "copy sent"),
                Err(e) => tracing::warn!(%device, copy, error = %e, "copy failed"),
            }
            outcomes.push(CopyOutcome { copy, result });
        }

        let report = PrintReport {
            device,
            requested,
            outcomes,
        };
        tracing::info!(
            device = %report.device,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "print batch finished"
        );
        report
    }

    pub fn into_inner(self) -> S {
        self.sink.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Slots to reserve for a batch; large quantities grow on demand.
fn outcome_capacity(quantity: Quantity) -> usize {
    quantity.get().min(PREALLOCATED_OUTCOMES) as usize
}

// ============================================================================
// TESTS
// ============================================================================

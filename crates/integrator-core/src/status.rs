//! Unit status reporting.

use integrator_types::UnitStatus;
use parking_lot::RwLock;
use tracing::info;

/// Receives status updates on behalf of the host.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, status: UnitStatus);
}

/// Status sink that keeps every update, newest last.
#[derive(Debug, Default)]
pub struct RecordingStatusSink {
    history: RwLock<Vec<UnitStatus>>,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with the status persisted by a previous invocation.
    pub fn with_initial(status: UnitStatus) -> Self {
        Self {
            history: RwLock::new(vec![status]),
        }
    }

    pub fn current(&self) -> UnitStatus {
        self.history.read().last().cloned().unwrap_or_default()
    }

    pub fn history(&self) -> Vec<UnitStatus> {
        self.history.read().clone()
    }
}

impl StatusSink for RecordingStatusSink {
    fn set_status(&self, status: UnitStatus) {
        info!(status = %status, "unit status updated");
        self.history.write().push(status);
    }
}

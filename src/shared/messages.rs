//! Message types delivered from the scanner to the presentation layer

use uuid::Uuid;

use crate::analysis::ReceiptRecord;

/// Progress and completion notifications for a capture request
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A capture request was accepted; the trigger should show "Processing..."
    Started { request_id: Uuid },
    /// Extraction finished
    Completed {
        request_id: Uuid,
        record: Box<ReceiptRecord>,
    },
    /// Capture failed before extraction; the trigger should return to ready
    Failed {
        /// `None` when the request was rejected before it started
        request_id: Option<Uuid>,
        reason: String,
    },
}

impl ScanEvent {
    /// Whether this event ends a request (trigger can be re-enabled)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanEvent::Started { .. })
    }
}

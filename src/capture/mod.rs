//! Capture Layer
//!
//! Frames come from the camera pipeline outside this crate. A [`CaptureSession`]
//! serializes capture requests: only one extraction may be in flight per session.

pub mod frame;
pub mod recording;

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ScanError;

/// Serializes capture requests for one camera/UI surface
#[derive(Debug, Default)]
pub struct CaptureSession {
    in_flight: Mutex<Option<Uuid>>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a capture request, or fail with [`ScanError::Busy`] if one is running.
    ///
    /// The session stays busy until the returned guard is dropped.
    pub fn try_begin(&self) -> Result<CaptureRequest<'_>, ScanError> {
        let mut in_flight = self.in_flight.lock();
        if let Some(request_id) = *in_flight {
            warn!("Rejecting capture: request {} still in flight", request_id);
            return Err(ScanError::Busy { request_id });
        }

        let id = Uuid::new_v4();
        *in_flight = Some(id);
        debug!("Capture request {} started", id);

        Ok(CaptureRequest {
            id,
            started: Instant::now(),
            session: self,
        })
    }

    /// Whether a capture is currently being processed
    pub fn is_capturing(&self) -> bool {
        self.in_flight.lock().is_some()
    }
}

/// An in-flight capture request. Dropping it frees the session.
#[derive(Debug)]
pub struct CaptureRequest<'a> {
    id: Uuid,
    started: Instant,
    session: &'a CaptureSession,
}

impl CaptureRequest<'_> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for CaptureRequest<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.session.in_flight.lock();
        if *in_flight == Some(self.id) {
            *in_flight = None;
        }
        debug!("Capture request {} finished after {:?}", self.id, self.started.elapsed());
    }
}

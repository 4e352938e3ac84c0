//! Error types for the scanning pipeline
//!
//! Only genuine upstream failures are errors. A field that no pattern matches is a
//! normal outcome and is reported through the "Not found" sentinel instead.

use thiserror::Error;
use uuid::Uuid;

use crate::analysis::FieldName;

#[derive(Debug, Error)]
pub enum ScanError {
    /// No frame has been captured yet
    #[error("camera not ready")]
    CameraNotReady,

    /// Another capture is still being processed
    #[error("capture {request_id} is already in progress")]
    Busy { request_id: Uuid },

    /// Object detector failed (initialization or inference)
    #[error("object detection failed: {0}")]
    Detection(String),

    /// OCR engine reported a failure
    #[error("OCR processing failed: {0}")]
    Recognition(String),

    /// Frame→crop transform cannot be inverted
    #[error("frame transform is not invertible (determinant {determinant})")]
    NonInvertibleTransform { determinant: f32 },

    /// A configured field pattern does not compile
    #[error("invalid pattern for field {field}: {pattern}")]
    InvalidPattern {
        field: FieldName,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

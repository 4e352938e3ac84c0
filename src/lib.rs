//! receipt-scan - Receipt field extraction
//!
//! Turns OCR text blocks from a photographed receipt, optionally narrowed down by
//! object-detection regions, into a fixed record of eight business fields.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod error;
pub mod shared;
pub mod storage;
pub mod vision;

pub use analysis::{FieldExtractor, FieldName, ReceiptRecord, NOT_FOUND};
pub use capture::{frame::CapturedFrame, CaptureSession};
pub use config::AppConfig;
pub use error::ScanError;
pub use shared::ScanEvent;
pub use vision::{ReceiptScanner, ScannerConfig};

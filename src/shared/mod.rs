//! Messaging between the scanner and its consumer
//!
//! Results are sent over a channel so the presentation layer receives them on
//! its own thread rather than on the OCR or detector worker.

pub mod messages;

pub use messages::ScanEvent;

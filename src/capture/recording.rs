//! Recorded captures
//!
//! A recording holds the detector and OCR output for one frame as JSON, so the
//! extraction pipeline can be replayed without a camera or models.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::capture::frame::CapturedFrame;
use crate::vision::{Detection, TextBlock};

/// Dimensions of the recorded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Detector and OCR output recorded for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCapture {
    pub frame: FrameSize,
    /// Detections in detector crop space
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// OCR text blocks in frame space
    pub text_blocks: Vec<TextBlock>,
}

impl RecordedCapture {
    /// Frame stand-in with the recorded dimensions
    pub fn frame(&self) -> CapturedFrame {
        CapturedFrame::placeholder(self.frame.width, self.frame.height)
    }
}

/// Load a recorded capture from a JSON file
pub fn load_recording(path: &Path) -> Result<RecordedCapture> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recording {:?}", path))?;
    let recording: RecordedCapture = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse recording {:?}", path))?;
    Ok(recording)
}

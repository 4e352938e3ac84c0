//! OCR (Optical Character Recognition) interface
//!
//! The OCR engine delivers its result asynchronously. Here that is modelled as a
//! single awaited call that either yields text blocks or fails.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capture::frame::CapturedFrame;
use crate::vision::geometry::Rect;

/// A block of recognized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Recognized text, possibly spanning several lines
    pub text: String,
    /// Bounding box in original-image space
    pub bounds: Rect,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, bounds: Rect) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }

    /// Create from a polygon-shaped OCR result
    pub fn from_polygon(text: impl Into<String>, polygon: &[(f32, f32)]) -> Self {
        Self::new(text, Rect::from_polygon(polygon))
    }
}

/// OCR engine
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize all text blocks in the frame
    async fn recognize(&self, frame: &CapturedFrame) -> Result<Vec<TextBlock>>;
}

/// Recognizer that returns pre-recorded text blocks
#[derive(Debug, Clone)]
pub struct RecordedRecognizer {
    blocks: Option<Vec<TextBlock>>,
}

impl RecordedRecognizer {
    pub fn new(blocks: Vec<TextBlock>) -> Self {
        Self { blocks: Some(blocks) }
    }

    /// A recognizer whose every call fails
    pub fn failing() -> Self {
        Self { blocks: None }
    }
}

#[async_trait]
impl TextRecognizer for RecordedRecognizer {
    async fn recognize(&self, _frame: &CapturedFrame) -> Result<Vec<TextBlock>> {
        self.blocks
            .clone()
            .ok_or_else(|| anyhow!("recorded recognizer has no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_block_from_polygon() {
        let block = TextBlock::from_polygon("TOTAL 9.99", &[(10.0, 5.0), (60.0, 5.0), (60.0, 20.0), (10.0, 20.0)]);
        assert_eq!(block.bounds, Rect::new(10.0, 5.0, 60.0, 20.0));
        assert_eq!(block.text, "TOTAL 9.99");
    }

    #[tokio::test]
    async fn test_recorded_recognizer() {
        let frame = CapturedFrame::new(vec![], 10, 10);
        let ok = RecordedRecognizer::new(vec![TextBlock::new("hi", Rect::default())]);
        assert_eq!(ok.recognize(&frame).await.unwrap().len(), 1);

        let failing = RecordedRecognizer::failing();
        assert!(failing.recognize(&frame).await.is_err());
    }
}

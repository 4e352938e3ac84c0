//! Object detection interface
//!
//! The detector model itself lives outside this crate. It receives the captured
//! frame together with the frame→crop transform and returns labelled boxes in
//! crop coordinates.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::capture::frame::CapturedFrame;
use crate::vision::geometry::{Rect, Transform};

/// A labelled box reported by the object detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label from the detector model (e.g. "TotalPrice")
    pub class_label: String,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Bounding box in detector crop space
    pub bounds: Rect,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, confidence: f32, bounds: Rect) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bounds,
        }
    }
}

/// Object detector producing labelled regions for a frame
pub trait ObjectDetector: Send + Sync {
    /// Side length of the square model input
    fn input_size(&self) -> u32;

    /// Run detection. Returned boxes are in crop space.
    fn detect(&self, frame: &CapturedFrame, frame_to_crop: &Transform) -> Result<Vec<Detection>>;
}

/// Detector that returns a fixed set of detections, e.g. from a recorded capture
#[derive(Debug, Clone)]
pub struct RecordedDetector {
    input_size: u32,
    detections: Vec<Detection>,
}

impl RecordedDetector {
    pub fn new(input_size: u32, detections: Vec<Detection>) -> Self {
        Self { input_size, detections }
    }
}

impl ObjectDetector for RecordedDetector {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn detect(&self, _frame: &CapturedFrame, _frame_to_crop: &Transform) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_detector_replays() {
        let detections = vec![
            Detection::new("Tax", 0.9, Rect::new(0.0, 0.0, 10.0, 10.0)),
            Detection::new("Logo", 0.4, Rect::new(5.0, 5.0, 20.0, 20.0)),
        ];
        let detector = RecordedDetector::new(640, detections.clone());
        let frame = CapturedFrame::new(vec![], 640, 640);

        assert_eq!(detector.input_size(), 640);
        let result = detector.detect(&frame, &Transform::identity()).unwrap();
        assert_eq!(result, detections);
    }

    #[test]
    fn test_detection_json_shape() {
        let json = r#"{"class_label":"OrderId","confidence":0.75,
            "bounds":{"left":1.0,"top":2.0,"right":3.0,"bottom":4.0}}"#;
        let detection: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(detection.class_label, "OrderId");
        assert_eq!(detection.bounds, Rect::new(1.0, 2.0, 3.0, 4.0));
    }
}

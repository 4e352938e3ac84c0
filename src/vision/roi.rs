//! Regions of interest
//!
//! Detections that look like receipt fields become regions in frame space. Text
//! blocks outside every region are skipped in the block-scoped extraction pass.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::FieldName;
use crate::vision::detection::Detection;
use crate::vision::geometry::{FrameTransforms, Rect};

/// Default minimum detection confidence for a region of interest
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

/// A region of interest in original-image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub bounds: Rect,
}

/// Whether a detector class label names one of the receipt fields
pub fn is_text_relevant_class(class_label: &str) -> bool {
    let label = class_label.to_lowercase();
    FieldName::ALL
        .iter()
        .any(|field| label.contains(field.detector_class()))
}

/// Select regions of interest from detections.
///
/// Keeps detections at or above `min_confidence` whose label is text-relevant and
/// projects their boxes into frame space. Input order and duplicates are preserved.
pub fn select_regions(
    detections: &[Detection],
    min_confidence: f32,
    transforms: &FrameTransforms,
) -> Vec<Region> {
    let regions: Vec<Region> = detections
        .iter()
        .filter(|d| d.confidence >= min_confidence)
        .filter(|d| is_text_relevant_class(&d.class_label))
        .map(|d| Region {
            bounds: transforms.to_frame(&d.bounds),
        })
        .collect();

    debug!(
        "Selected {} regions of interest from {} detections",
        regions.len(),
        detections.len()
    );

    regions
}

/// A block is in scope when there are no regions or it overlaps at least one
pub fn in_scope(block_bounds: &Rect, regions: &[Region]) -> bool {
    regions.is_empty() || regions.iter().any(|r| block_bounds.intersects(&r.bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::geometry::Transform;

    fn identity() -> FrameTransforms {
        FrameTransforms::from_forward(Transform::identity()).unwrap()
    }

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_text_relevant_classes() {
        assert!(is_text_relevant_class("TotalPrice"));
        assert!(is_text_relevant_class("receipt_orderid"));
        assert!(is_text_relevant_class("SALES-TAX"));
        assert!(!is_text_relevant_class("order_id"));
        assert!(!is_text_relevant_class("logo"));
    }

    #[test]
    fn test_select_filters_threshold_and_vocabulary() {
        let detections = vec![
            det("Date", 0.29),
            det("Date", 0.3),
            det("barcode", 0.99),
            det("Subtotal", 0.8),
        ];
        let regions = select_regions(&detections, DEFAULT_MIN_CONFIDENCE, &identity());
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn test_select_preserves_order_and_duplicates() {
        let detections = vec![
            Detection::new("title", 0.9, Rect::new(0.0, 0.0, 5.0, 5.0)),
            Detection::new("tax", 0.9, Rect::new(1.0, 1.0, 6.0, 6.0)),
            Detection::new("tax", 0.9, Rect::new(1.0, 1.0, 6.0, 6.0)),
        ];
        let regions = select_regions(&detections, 0.5, &identity());
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].bounds, Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(regions[1], regions[2]);
    }

    #[test]
    fn test_select_projects_into_frame_space() {
        // Detector input is half the frame size
        let transforms =
            FrameTransforms::from_forward(Transform::identity().post_scale(0.5, 0.5)).unwrap();
        let detections = vec![Detection::new("address", 0.9, Rect::new(10.0, 10.0, 20.0, 30.0))];
        let regions = select_regions(&detections, 0.3, &transforms);
        assert!(regions[0]
            .bounds
            .approx_eq(&Rect::new(20.0, 20.0, 40.0, 60.0), 1e-4));
    }

    #[test]
    fn test_in_scope() {
        let regions = vec![Region {
            bounds: Rect::new(0.0, 0.0, 100.0, 50.0),
        }];
        assert!(in_scope(&Rect::new(90.0, 40.0, 120.0, 60.0), &regions));
        assert!(!in_scope(&Rect::new(100.0, 0.0, 120.0, 50.0), &regions));
        assert!(!in_scope(&Rect::new(0.0, 60.0, 10.0, 70.0), &regions));
    }

    #[test]
    fn test_everything_in_scope_without_regions() {
        assert!(in_scope(&Rect::new(1e6, 1e6, 1e6 + 1.0, 1e6 + 1.0), &[]));
    }
}

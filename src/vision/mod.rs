//! Vision Layer
//!
//! Runs object detection and OCR on a captured frame and feeds the results into
//! field extraction. The detector and OCR engine are external collaborators
//! behind the [`ObjectDetector`] and [`TextRecognizer`] traits.

pub mod detection;
pub mod geometry;
pub mod ocr;
pub mod roi;

use crossbeam_channel::Sender;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::analysis::{CascadeTable, FieldExtractor, ReceiptRecord};
use crate::capture::frame::CapturedFrame;
use crate::capture::{CaptureRequest, CaptureSession};
use crate::config::AppConfig;
use crate::error::ScanError;
use crate::shared::ScanEvent;

pub use detection::{Detection, ObjectDetector, RecordedDetector};
pub use geometry::{FrameTransforms, Rect, Transform};
pub use ocr::{RecordedRecognizer, TextBlock, TextRecognizer};
pub use roi::{in_scope, is_text_relevant_class, select_regions, Region, DEFAULT_MIN_CONFIDENCE};

/// Configuration for the scanning pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    /// Minimum detection confidence for a region of interest (0.0 - 1.0)
    pub min_confidence: f32,
    /// Camera sensor rotation relative to the screen, in degrees
    pub sensor_orientation: i32,
    /// Keep the frame aspect ratio when scaling to the detector input
    pub maintain_aspect: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            sensor_orientation: 0,
            maintain_aspect: true,
        }
    }
}

impl From<&AppConfig> for ScannerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_confidence: config.extraction.min_confidence,
            sensor_orientation: config.detector.sensor_orientation,
            maintain_aspect: config.detector.maintain_aspect,
        }
    }
}

/// Detection + OCR + extraction for one captured frame at a time
pub struct ReceiptScanner {
    detector: Arc<dyn ObjectDetector>,
    recognizer: Arc<dyn TextRecognizer>,
    cascades: Arc<CascadeTable>,
    config: ScannerConfig,
}

impl ReceiptScanner {
    /// Create a scanner using the built-in field cascades
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        recognizer: Arc<dyn TextRecognizer>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            detector,
            recognizer,
            cascades: Arc::new(CascadeTable::builtin().clone()),
            config,
        }
    }

    /// Create a scanner from application settings, including any extra field rules
    pub fn from_config(
        config: &AppConfig,
        detector: Arc<dyn ObjectDetector>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Result<Self, ScanError> {
        let cascades = CascadeTable::with_extra_rules(&config.extraction.extra_rules)?;
        if !config.extraction.extra_rules.is_empty() {
            info!("Loaded {} custom field rules", config.extraction.extra_rules.len());
        }

        Ok(Self {
            detector,
            recognizer,
            cascades: Arc::new(cascades),
            config: ScannerConfig::from(config),
        })
    }

    /// Capture and extract a receipt record from `frame`.
    ///
    /// Fails with [`ScanError::CameraNotReady`] without a frame and with
    /// [`ScanError::Busy`] while another request on `session` is in flight.
    pub async fn scan(
        &self,
        session: &CaptureSession,
        frame: Option<CapturedFrame>,
    ) -> Result<ReceiptRecord, ScanError> {
        let frame = frame.ok_or(ScanError::CameraNotReady)?;
        let request = session.try_begin()?;
        self.process(&request, Arc::new(frame)).await
    }

    /// Like [`scan`](Self::scan), also reporting progress on `events`.
    ///
    /// The session is released before the terminal event is sent, so the
    /// consumer may trigger the next capture as soon as it receives it.
    pub async fn scan_and_notify(
        &self,
        session: &CaptureSession,
        frame: Option<CapturedFrame>,
        events: &Sender<ScanEvent>,
    ) -> Result<ReceiptRecord, ScanError> {
        let Some(frame) = frame else {
            let err = ScanError::CameraNotReady;
            notify(events, ScanEvent::Failed { request_id: None, reason: err.to_string() });
            return Err(err);
        };

        let request = match session.try_begin() {
            Ok(request) => request,
            Err(err) => {
                notify(events, ScanEvent::Failed { request_id: None, reason: err.to_string() });
                return Err(err);
            }
        };

        let request_id = request.id();
        notify(events, ScanEvent::Started { request_id });

        let result = self.process(&request, Arc::new(frame)).await;
        drop(request);

        match &result {
            Ok(record) => notify(
                events,
                ScanEvent::Completed {
                    request_id,
                    record: Box::new(record.clone()),
                },
            ),
            Err(err) => notify(
                events,
                ScanEvent::Failed {
                    request_id: Some(request_id),
                    reason: err.to_string(),
                },
            ),
        }

        result
    }

    async fn process(
        &self,
        request: &CaptureRequest<'_>,
        frame: Arc<CapturedFrame>,
    ) -> Result<ReceiptRecord, ScanError> {
        let transforms = FrameTransforms::new(
            frame.width,
            frame.height,
            self.detector.input_size(),
            self.config.sensor_orientation,
            self.config.maintain_aspect,
        )?;

        // Detection is CPU-bound; keep it off the async workers
        let detector = Arc::clone(&self.detector);
        let detector_frame = Arc::clone(&frame);
        let frame_to_crop = transforms.frame_to_crop;
        let detections = tokio::task::spawn_blocking(move || {
            detector.detect(&detector_frame, &frame_to_crop)
        })
        .await
        .map_err(|e| ScanError::Detection(e.to_string()))?
        .map_err(|e| {
            error!("Object detection failed for {}: {:#}", request.id(), e);
            ScanError::Detection(format!("{:#}", e))
        })?;

        let regions = select_regions(&detections, self.config.min_confidence, &transforms);

        let blocks = self.recognizer.recognize(&frame).await.map_err(|e| {
            error!("OCR processing failed for {}: {:#}", request.id(), e);
            ScanError::Recognition(format!("{:#}", e))
        })?;
        debug!(
            "Request {}: {} text blocks, {} regions",
            request.id(),
            blocks.len(),
            regions.len()
        );

        let record = FieldExtractor::new(&self.cascades).extract_record(&blocks, &regions);

        info!(
            "OCR results - address: {}, date: {}, item: {}, order_id: {}, subtotal: {}, tax: {}, title: {}, total_price: {}",
            record.address,
            record.date,
            record.item,
            record.order_id,
            record.subtotal,
            record.tax,
            record.title,
            record.total_price
        );
        debug!("Request {} completed in {:?}", request.id(), request.elapsed());

        Ok(record)
    }
}

fn notify(events: &Sender<ScanEvent>, event: ScanEvent) {
    if events.send(event).is_err() {
        warn!("Scan event receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FieldName, RuleSpec, NOT_FOUND};
    use anyhow::anyhow;
    use crossbeam_channel::unbounded;

    struct FailingDetector;

    impl ObjectDetector for FailingDetector {
        fn input_size(&self) -> u32 {
            640
        }

        fn detect(&self, _frame: &CapturedFrame, _t: &Transform) -> anyhow::Result<Vec<Detection>> {
            Err(anyhow!("model not loaded"))
        }
    }

    fn receipt_blocks() -> Vec<TextBlock> {
        vec![
            TextBlock::new("Subtotal: $10.00", Rect::new(0.0, 0.0, 300.0, 40.0)),
            TextBlock::new("Subtotal: $99.00", Rect::new(0.0, 600.0, 300.0, 640.0)),
            TextBlock::new("Date: 07/04/2024", Rect::new(0.0, 300.0, 300.0, 340.0)),
        ]
    }

    fn scanner_with(detections: Vec<Detection>, recognizer: RecordedRecognizer) -> ReceiptScanner {
        ReceiptScanner::new(
            Arc::new(RecordedDetector::new(640, detections)),
            Arc::new(recognizer),
            ScannerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_scan_uses_regions() {
        // 640x640 frame into a 640 crop: identity projection
        let detections = vec![
            Detection::new("Subtotal", 0.9, Rect::new(0.0, 0.0, 320.0, 50.0)),
            Detection::new("Subtotal", 0.1, Rect::new(0.0, 590.0, 320.0, 640.0)),
        ];
        let scanner = scanner_with(detections, RecordedRecognizer::new(receipt_blocks()));
        let session = CaptureSession::new();

        let record = scanner
            .scan(&session, Some(CapturedFrame::placeholder(640, 640)))
            .await
            .unwrap();

        assert_eq!(record.subtotal, "$10.00");
        // Date block is outside the region; found by the full-text pass
        assert_eq!(record.date, "07/04/2024");
        assert_eq!(record.address, NOT_FOUND);
        assert!(!session.is_capturing());
    }

    #[tokio::test]
    async fn test_scan_without_frame() {
        let scanner = scanner_with(vec![], RecordedRecognizer::new(vec![]));
        let session = CaptureSession::new();
        let result = scanner.scan(&session, None).await;
        assert!(matches!(result, Err(ScanError::CameraNotReady)));
        assert!(!session.is_capturing());
    }

    #[tokio::test]
    async fn test_ocr_failure_short_circuits_and_resets() {
        let scanner = scanner_with(vec![], RecordedRecognizer::failing());
        let session = CaptureSession::new();
        let (tx, rx) = unbounded();

        let result = scanner
            .scan_and_notify(&session, Some(CapturedFrame::placeholder(100, 100)), &tx)
            .await;

        assert!(matches!(result, Err(ScanError::Recognition(_))));
        assert!(!session.is_capturing());

        let events: Vec<ScanEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ScanEvent::Started { .. }));
        assert!(matches!(events[1], ScanEvent::Failed { request_id: Some(_), .. }));
        assert!(events[1].is_terminal());
    }

    #[tokio::test]
    async fn test_detector_failure() {
        let scanner = ReceiptScanner::new(
            Arc::new(FailingDetector),
            Arc::new(RecordedRecognizer::new(receipt_blocks())),
            ScannerConfig::default(),
        );
        let session = CaptureSession::new();
        let result = scanner
            .scan(&session, Some(CapturedFrame::placeholder(640, 480)))
            .await;
        assert!(matches!(result, Err(ScanError::Detection(_))));
        assert!(session.try_begin().is_ok());
    }

    #[tokio::test]
    async fn test_zero_sized_frame_fails_projection() {
        let detections = vec![Detection::new("Subtotal", 0.9, Rect::new(0.0, 0.0, 320.0, 50.0))];
        let scanner = scanner_with(detections, RecordedRecognizer::new(receipt_blocks()));
        let session = CaptureSession::new();

        let result = scanner
            .scan(&session, Some(CapturedFrame::placeholder(0, 0)))
            .await;

        assert!(matches!(result, Err(ScanError::NonInvertibleTransform { .. })));
        assert!(!session.is_capturing());
    }

    #[tokio::test]
    async fn test_busy_session_rejects_capture() {
        let scanner = scanner_with(vec![], RecordedRecognizer::new(receipt_blocks()));
        let session = CaptureSession::new();
        let _in_flight = session.try_begin().unwrap();
        let (tx, rx) = unbounded();

        let result = scanner
            .scan_and_notify(&session, Some(CapturedFrame::placeholder(640, 640)), &tx)
            .await;

        assert!(matches!(result, Err(ScanError::Busy { .. })));
        let events: Vec<ScanEvent> = rx.try_iter().collect();
        assert!(matches!(events.as_slice(), [ScanEvent::Failed { request_id: None, .. }]));
    }

    #[tokio::test]
    async fn test_completed_event_carries_record() {
        let scanner = scanner_with(vec![], RecordedRecognizer::new(receipt_blocks()));
        let session = CaptureSession::new();
        let (tx, rx) = unbounded();

        let record = scanner
            .scan_and_notify(&session, Some(CapturedFrame::placeholder(640, 640)), &tx)
            .await
            .unwrap();

        let events: Vec<ScanEvent> = rx.try_iter().collect();
        match &events[1] {
            ScanEvent::Completed { record: delivered, .. } => assert_eq!(**delivered, record),
            other => panic!("unexpected event {:?}", other),
        }
        // No regions: the first block fills subtotal
        assert_eq!(record.subtotal, "$10.00");
    }

    #[tokio::test]
    async fn test_from_config_with_extra_rules() {
        let mut config = AppConfig::default();
        config.extraction.extra_rules = vec![RuleSpec::new(FieldName::OrderId, r"ticket\s*([0-9]+)")];

        let scanner = ReceiptScanner::from_config(
            &config,
            Arc::new(RecordedDetector::new(640, vec![])),
            Arc::new(RecordedRecognizer::new(vec![TextBlock::new(
                "Ticket 9981",
                Rect::new(0.0, 0.0, 10.0, 10.0),
            )])),
        )
        .unwrap();

        let record = scanner
            .scan(&CaptureSession::new(), Some(CapturedFrame::placeholder(640, 640)))
            .await
            .unwrap();
        assert_eq!(record.order_id, "9981");
    }
}

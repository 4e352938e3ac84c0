//! Still frames handed to the detector and the OCR engine

/// A still frame taken from the camera preview
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// RGBA pixels, row-major. Empty when replaying a recording.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CapturedFrame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self { pixels, width, height }
    }

    /// Frame with dimensions only, for replaying recorded detections and text
    pub fn placeholder(width: u32, height: u32) -> Self {
        Self::new(Vec::new(), width, height)
    }
}

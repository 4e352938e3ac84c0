//! Geometry primitives for detection and OCR boxes
//!
//! Rectangles live in either the detector's crop space or the original frame space.
//! [`Transform`] maps between the two.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ScanError;

/// Axis-aligned rectangle (left, top, right, bottom)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Bounding box of a polygon, as produced by polygon-based OCR engines
    pub fn from_polygon(polygon: &[(f32, f32)]) -> Self {
        if polygon.is_empty() {
            return Self::default();
        }

        let min_x = polygon.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
        let min_y = polygon.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_x = polygon.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
        let max_y = polygon.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

        Self::new(min_x, min_y, max_x, max_y)
    }

    /// True when the two rectangles share a region of non-zero area.
    ///
    /// Edges that only touch do not count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        let overlap_w = self.right.min(other.right) - self.left.max(other.left);
        let overlap_h = self.bottom.min(other.bottom) - self.top.max(other.top);
        overlap_w > 0.0 && overlap_h > 0.0
    }

    /// Approximate equality, for comparing projected boxes
    pub fn approx_eq(&self, other: &Rect, tolerance: f32) -> bool {
        (self.left - other.left).abs() <= tolerance
            && (self.top - other.top).abs() <= tolerance
            && (self.right - other.right).abs() <= tolerance
            && (self.bottom - other.bottom).abs() <= tolerance
    }
}

/// 2x3 affine transform: `x' = a*x + b*y + c`, `y' = d*x + e*y + f`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 0.0, e: 1.0, f: 0.0 }
    }

    /// Build from raw matrix coefficients (row-major, 2x3)
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.e - self.b * self.d
    }

    /// Apply `other` after `self`
    fn then(self, other: Transform) -> Self {
        Self {
            a: other.a * self.a + other.b * self.d,
            b: other.a * self.b + other.b * self.e,
            c: other.a * self.c + other.b * self.f + other.c,
            d: other.d * self.a + other.e * self.d,
            e: other.d * self.b + other.e * self.e,
            f: other.d * self.c + other.e * self.f + other.f,
        }
    }

    pub fn post_translate(self, dx: f32, dy: f32) -> Self {
        self.then(Self::from_coefficients(1.0, 0.0, dx, 0.0, 1.0, dy))
    }

    pub fn post_scale(self, sx: f32, sy: f32) -> Self {
        self.then(Self::from_coefficients(sx, 0.0, 0.0, 0.0, sy, 0.0))
    }

    /// Rotate clockwise (in image coordinates) by `degrees` around the origin
    pub fn post_rotate(self, degrees: i32) -> Self {
        let (sin, cos) = match degrees.rem_euclid(360) {
            0 => (0.0, 1.0),
            90 => (1.0, 0.0),
            180 => (0.0, -1.0),
            270 => (-1.0, 0.0),
            other => (other as f32).to_radians().sin_cos(),
        };
        self.then(Self::from_coefficients(cos, -sin, 0.0, sin, cos, 0.0))
    }

    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    /// Map all four corners and return their bounding box
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.map_point(rect.left, rect.top),
            self.map_point(rect.right, rect.top),
            self.map_point(rect.right, rect.bottom),
            self.map_point(rect.left, rect.bottom),
        ];
        Rect::from_polygon(&corners)
    }

    /// Inverse transform, or an error when the matrix is singular or not finite
    pub fn invert(&self) -> Result<Transform, ScanError> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < f32::EPSILON {
            return Err(ScanError::NonInvertibleTransform { determinant: det });
        }

        Ok(Self {
            a: self.e / det,
            b: -self.b / det,
            c: (self.b * self.f - self.e * self.c) / det,
            d: -self.d / det,
            e: self.a / det,
            f: (self.d * self.c - self.a * self.f) / det,
        })
    }
}

/// Forward and inverse transforms between the camera frame and the detector crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    pub frame_to_crop: Transform,
    pub crop_to_frame: Transform,
}

impl FrameTransforms {
    /// Build the frame→crop transform for a square detector input and invert it.
    ///
    /// The frame is centred, rotated by `sensor_orientation` degrees, scaled to the
    /// crop and re-centred. With `maintain_aspect` both axes use the larger scale factor.
    pub fn new(
        frame_width: u32,
        frame_height: u32,
        crop_size: u32,
        sensor_orientation: i32,
        maintain_aspect: bool,
    ) -> Result<Self, ScanError> {
        if frame_width == 0 || frame_height == 0 || crop_size == 0 {
            warn!(
                "Cannot project a {}x{} frame into a {} crop",
                frame_width, frame_height, crop_size
            );
            return Err(ScanError::NonInvertibleTransform { determinant: 0.0 });
        }

        let mut matrix = Transform::identity();

        if sensor_orientation != 0 {
            if sensor_orientation % 90 != 0 {
                warn!("Rotation of {} % 90 != 0", sensor_orientation);
            }
            matrix = matrix
                .post_translate(-(frame_width as f32) / 2.0, -(frame_height as f32) / 2.0)
                .post_rotate(sensor_orientation);
        }

        let transpose = (sensor_orientation.abs() + 90) % 180 == 0;
        let (in_width, in_height) = if transpose {
            (frame_height, frame_width)
        } else {
            (frame_width, frame_height)
        };

        if in_width != crop_size || in_height != crop_size {
            let scale_x = crop_size as f32 / in_width as f32;
            let scale_y = crop_size as f32 / in_height as f32;
            matrix = if maintain_aspect {
                let scale = scale_x.max(scale_y);
                matrix.post_scale(scale, scale)
            } else {
                matrix.post_scale(scale_x, scale_y)
            };
        }

        if sensor_orientation != 0 {
            matrix = matrix.post_translate(crop_size as f32 / 2.0, crop_size as f32 / 2.0);
        }

        Self::from_forward(matrix)
    }

    /// Wrap an arbitrary forward transform, computing its inverse
    pub fn from_forward(frame_to_crop: Transform) -> Result<Self, ScanError> {
        let crop_to_frame = frame_to_crop.invert()?;
        Ok(Self { frame_to_crop, crop_to_frame })
    }

    /// Project a crop-space box into frame space
    pub fn to_frame(&self, crop_box: &Rect) -> Rect {
        self.crop_to_frame.map_rect(crop_box)
    }

    /// Project a frame-space box into crop space
    pub fn to_crop(&self, frame_box: &Rect) -> Rect {
        self.frame_to_crop.map_rect(frame_box)
    }
}

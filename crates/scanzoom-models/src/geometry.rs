//! Frame geometry in pixel coordinates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a box from its left/top/right/bottom edges.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Center x-coordinate.
    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Center y-coordinate.
    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// True when every coordinate is finite and both dimensions are positive.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Larger of the two frame-normalized dimensions, or `None` for a
    /// degenerate frame or box.
    pub fn size_ratio(&self, frame: FrameSize) -> Option<f64> {
        if frame.is_empty() || !self.is_valid() {
            return None;
        }
        let w = self.width / frame.width as f64;
        let h = self.height / frame.height as f64;
        Some(w.max(h)).filter(|ratio| ratio.is_finite())
    }

    /// Horizontal offset of the box center from the frame center,
    /// normalized to the frame width (`-0.5..=0.5` for boxes inside the frame).
    pub fn horizontal_offset(&self, frame: FrameSize) -> Option<f64> {
        if frame.is_empty() || !self.is_valid() {
            return None;
        }
        Some(self.cx() / frame.width as f64 - 0.5).filter(|dx| dx.is_finite())
    }
}

/// Pixel dimensions of an analyzed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_ratio_uses_larger_dimension() {
        let frame = FrameSize::new(1000, 500);
        let wide = BoundingBox::new(0.0, 0.0, 200.0, 50.0);
        let tall = BoundingBox::new(0.0, 0.0, 50.0, 200.0);

        assert!((wide.size_ratio(frame).unwrap() - 0.2).abs() < 1e-9);
        assert!((tall.size_ratio(frame).unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_size_ratio_degenerate_frame() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.size_ratio(FrameSize::new(0, 480)).is_none());
        assert!(bbox.horizontal_offset(FrameSize::new(640, 0)).is_none());
    }

    #[test]
    fn test_non_finite_or_empty_box_has_no_geometry() {
        let frame = FrameSize::new(1000, 1000);
        let boxes = [
            BoundingBox::new(f64::NAN, 0.0, 100.0, 100.0),
            BoundingBox::new(0.0, 0.0, f64::NAN, 100.0),
            BoundingBox::new(0.0, 0.0, 100.0, f64::INFINITY),
            BoundingBox::new(0.0, 0.0, 0.0, 100.0),
            BoundingBox::new(0.0, 0.0, 100.0, -5.0),
        ];
        for bbox in boxes {
            assert!(!bbox.is_valid());
            assert!(bbox.size_ratio(frame).is_none());
            assert!(bbox.horizontal_offset(frame).is_none());
        }
    }

    #[test]
    fn test_horizontal_offset() {
        let frame = FrameSize::new(1000, 1000);
        let centered = BoundingBox::new(450.0, 100.0, 100.0, 100.0);
        let right = BoundingBox::new(700.0, 100.0, 100.0, 100.0);

        assert!(centered.horizontal_offset(frame).unwrap().abs() < 1e-9);
        assert!((right.horizontal_offset(frame).unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_from_edges() {
        let bbox = BoundingBox::from_edges(10.0, 20.0, 110.0, 70.0);
        assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 100.0, 50.0));
        assert!((bbox.cx() - 60.0).abs() < 1e-9);
        assert!((bbox.cy() - 45.0).abs() < 1e-9);
    }
}

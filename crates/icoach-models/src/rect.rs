//! Bounding box in pixel coordinates.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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
        Self {
            x,
            y,
            width,
            height,
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

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Box area as a fraction of a frame's area.
    pub fn area_ratio(&self, frame_width: u32, frame_height: u32) -> f64 {
        let frame_area = frame_width as f64 * frame_height as f64;
        if frame_area > 0.0 {
            self.area() / frame_area
        } else {
            0.0
        }
    }

    /// Clamp the box to frame boundaries.
    pub fn clamp(&self, frame_width: u32, frame_height: u32) -> BoundingBox {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        let x = self.x.max(0.0);
        let y = self.y.max(0.0);
        let width = (self.width - (x - self.x)).min(fw - x).max(0.0);
        let height = (self.height - (y - self.y)).min(fh - y).max(0.0);
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_area() {
        let b = BoundingBox::new(10.0, 20.0, 40.0, 60.0);
        assert_eq!(b.cx(), 30.0);
        assert_eq!(b.cy(), 50.0);
        assert_eq!(b.area(), 2400.0);
    }

    #[test]
    fn test_area_ratio() {
        let b = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert!((b.area_ratio(200, 100) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_inside_frame() {
        let b = BoundingBox::new(-10.0, -5.0, 50.0, 50.0).clamp(100, 100);
        assert_eq!(b.x, 0.0);
        assert_eq!(b.y, 0.0);
        assert_eq!(b.width, 40.0);
        assert_eq!(b.height, 45.0);
    }
}

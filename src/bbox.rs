//! Axis-aligned bounding boxes in pixel coordinates.

use crate::utils::safe_cast::pixel_coord;
use opencv::core::Point;
use serde::{Deserialize, Serialize};

/// Corner-form bounding box `(x1, y1)`-`(x2, y2)`.
///
/// Serializes as a plain `[x1, y1, x2, y2]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from center, width and height
    #[must_use]
    pub fn from_cxcywh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection over union, 0 when the union is empty
    #[must_use]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Clip the box to a `width` x `height` image
    #[must_use]
    pub fn clip(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }

    /// Top-left corner truncated to integer pixels
    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(pixel_coord(self.x1), pixel_coord(self.y1))
    }

    /// Bottom-right corner truncated to integer pixels
    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(pixel_coord(self.x2), pixel_coord(self.y2))
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

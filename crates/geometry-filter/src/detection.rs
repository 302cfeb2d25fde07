//! Detector output consumed by the filter

use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates (x1, y1) - (x2, y2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i64 {
        i64::from(self.x2) - i64::from(self.x1)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.y2) - i64::from(self.y1)
    }

    /// Area in pixels; `None` for degenerate, inverted or unrepresentable boxes
    pub fn area(&self) -> Option<i64> {
        let (w, h) = (self.width(), self.height());
        if w <= 0 || h <= 0 {
            return None;
        }
        w.checked_mul(h)
    }

    /// Width / height, `None` when the box has no positive height
    pub fn aspect_ratio(&self) -> Option<f64> {
        let h = self.height();
        if h <= 0 {
            return None;
        }
        Some(self.width() as f64 / h as f64)
    }
}

/// Single detection from the object detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class id
    pub class_id: i32,

    /// Detection confidence (0-1)
    pub confidence: f32,

    /// Bounding box
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: i32, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

/// Everything the detector reported for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    /// Frame width in pixels
    pub width: i32,

    /// Frame height in pixels
    pub height: i32,

    /// Detections, possibly empty
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl FrameDetections {
    /// Frame area in pixels; zero when either dimension is not positive
    pub fn frame_area(&self) -> i64 {
        if self.width <= 0 || self.height <= 0 {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_geometry() {
        let b = BoundingBox::new(10, 20, 110, 70);
        assert_eq!(b.width(), 100);
        assert_eq!(b.height(), 50);
        assert_eq!(b.area(), Some(5000));
        assert_eq!(b.aspect_ratio(), Some(2.0));
    }

    #[test]
    fn test_zero_height_has_no_aspect() {
        let b = BoundingBox::new(0, 10, 300, 10);
        assert_eq!(b.area(), None);
        assert!(b.aspect_ratio().is_none());
    }

    #[test]
    fn test_inverted_box_has_no_area() {
        let b = BoundingBox::new(300, 200, 0, 0);
        assert_eq!(b.area(), None);
        assert!(b.aspect_ratio().is_none());
    }

    #[test]
    fn test_extreme_box_area_does_not_overflow() {
        let b = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(b.width(), (1i64 << 32) - 1);
        assert_eq!(b.area(), None);
    }

    #[test]
    fn test_detection_json_uses_box_key() {
        let json = r#"{"class_id":0,"confidence":0.9,"box":{"x1":0,"y1":0,"x2":200,"y2":100}}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.class_id, 0);
        assert_eq!(det.bbox, BoundingBox::new(0, 0, 200, 100));
    }

    #[test]
    fn test_frame_without_detections_key() {
        let frame: FrameDetections = serde_json::from_str(r#"{"width":640,"height":480}"#).unwrap();
        assert!(frame.detections.is_empty());
        assert_eq!(frame.frame_area(), 640 * 480);
    }
}

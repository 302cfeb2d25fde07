//! Per-frame qualification

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Detection, FilterConfig, FrameDetections};

/// Why a detection was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Not the target class
    WrongClass,
    /// Below the confidence floor
    LowConfidence,
    /// Zero or negative width/height, or an area too large to represent
    Degenerate,
    /// Box smaller than the absolute pixel floor
    TooSmall,
    /// Box too small relative to the frame (too far away)
    TooFar,
    /// Width / height outside the accepted band
    BadShape,
}

/// Result of filtering one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    /// At least one detection passed every filter
    pub qualifying: bool,

    /// Detections that passed, kept for annotation
    pub passing: Vec<Detection>,
}

/// Stateless geometric filter
#[derive(Debug, Clone, Default)]
pub struct GeometricFilter {
    config: FilterConfig,
}

impl GeometricFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Filter every detection of a frame
    pub fn apply(&self, frame: &FrameDetections) -> FilterOutcome {
        let frame_area = frame.frame_area();
        if frame_area == 0 {
            return FilterOutcome::default();
        }

        let passing: Vec<Detection> = frame
            .detections
            .iter()
            .filter(|det| match self.check(det, frame_area) {
                Ok(()) => true,
                Err(reason) => {
                    trace!("Detection rejected ({:?}): {:?}", reason, det);
                    false
                }
            })
            .cloned()
            .collect();

        FilterOutcome {
            qualifying: !passing.is_empty(),
            passing,
        }
    }

    /// Check a single detection against the thresholds, in order
    pub fn check(&self, det: &Detection, frame_area: i64) -> Result<(), Rejection> {
        let cfg = &self.config;

        if det.class_id != cfg.target_class_id {
            return Err(Rejection::WrongClass);
        }
        if det.confidence < cfg.confidence_min {
            return Err(Rejection::LowConfidence);
        }

        let area = det.bbox.area().ok_or(Rejection::Degenerate)?;
        if area < cfg.min_box_area_px {
            return Err(Rejection::TooSmall);
        }
        if (area as f64) < cfg.min_area_fraction_of_frame * frame_area as f64 {
            return Err(Rejection::TooFar);
        }

        let aspect = det.bbox.aspect_ratio().ok_or(Rejection::Degenerate)?;
        if aspect < cfg.aspect_ratio_min || aspect > cfg.aspect_ratio_max {
            return Err(Rejection::BadShape);
        }

        Ok(())
    }
}

//! Filter thresholds

use serde::{Deserialize, Serialize};

/// Geometric filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Class id the detector uses for ambulances
    pub target_class_id: i32,

    /// Minimum detector confidence
    pub confidence_min: f32,

    /// Minimum box area in pixels
    pub min_box_area_px: i64,

    /// Minimum box area as a fraction of the whole frame
    pub min_area_fraction_of_frame: f64,

    /// Accepted width / height range (inclusive)
    pub aspect_ratio_min: f64,
    pub aspect_ratio_max: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            target_class_id: 0,
            confidence_min: 0.55,
            min_box_area_px: 25_000,
            min_area_fraction_of_frame: 0.12,
            aspect_ratio_min: 1.6,
            aspect_ratio_max: 3.8,
        }
    }
}

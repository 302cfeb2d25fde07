//! Geometric Filter
//!
//! Decides, per frame, whether any detection produced by the object
//! detector looks like an ambulance close enough to matter:
//! - Target class and minimum confidence
//! - Minimum box area (ignore phones, hands, toys)
//! - Minimum share of the frame (distance proxy)
//! - Ambulance-like aspect ratio

pub mod config;
pub mod detection;
pub mod filter;

pub use config::FilterConfig;
pub use detection::{BoundingBox, Detection, FrameDetections};
pub use filter::{FilterOutcome, GeometricFilter, Rejection};

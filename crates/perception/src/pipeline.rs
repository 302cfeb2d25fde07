//! Per-frame decision pipeline

use confirmation::{ConfirmationEvent, CooldownLimiter, TemporalConfirmer};
use geometry_filter::{FilterOutcome, FrameDetections, GeometricFilter};
use std::time::Instant;
use tracing::{debug, info};

use crate::{PerceptionError, PerceptionSettings};

/// What happened to one frame
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Filter verdict and passing boxes
    pub outcome: FilterOutcome,
    /// Set when the confirmer fired on this frame
    pub confirmed: Option<ConfirmationEvent>,
    /// Set when the event also cleared the cooldown
    pub forwarded: Option<ConfirmationEvent>,
}

/// Filter -> confirmer -> limiter, owned by the frame loop
pub struct Pipeline {
    filter: GeometricFilter,
    confirmer: TemporalConfirmer,
    limiter: CooldownLimiter,
}

impl Pipeline {
    pub fn new(settings: &PerceptionSettings) -> Result<Self, PerceptionError> {
        let confirmer = TemporalConfirmer::new(settings.confirm.clone())
            .map_err(|e| PerceptionError::Config(e.to_string()))?;

        Ok(Self {
            filter: GeometricFilter::new(settings.filter.clone()),
            confirmer,
            limiter: CooldownLimiter::new(settings.limiter.clone()),
        })
    }

    /// Run one frame observed at `now` through every stage
    pub fn process(&mut self, frame: &FrameDetections, now: Instant) -> FrameReport {
        metrics::counter!("frames_processed_total").increment(1);

        let outcome = self.filter.apply(frame);
        if outcome.qualifying {
            metrics::counter!("qualifying_frames_total").increment(1);
            for det in &outcome.passing {
                debug!(
                    "AMBULANCE {:.2} at ({}, {})-({}, {})",
                    det.confidence, det.bbox.x1, det.bbox.y1, det.bbox.x2, det.bbox.y2
                );
            }
        }

        let confirmed = self.confirmer.observe(outcome.qualifying, now);
        let forwarded = confirmed.clone().and_then(|event| {
            metrics::counter!("confirmations_total").increment(1);
            let forwarded = self.limiter.admit(event, now);
            if forwarded.is_none() {
                metrics::counter!("cooldown_drops_total").increment(1);
            }
            forwarded
        });

        if let Some(event) = &forwarded {
            info!("Confirmed ambulance, triggering signal {}", event.signal_id);
        }

        FrameReport {
            outcome,
            confirmed,
            forwarded,
        }
    }
}

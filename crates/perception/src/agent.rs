//! Frame loop

use dispatcher::{DispatchError, DispatchReceipt, EventDispatcher};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{DetectionSource, PerceptionError, PerceptionSettings, Pipeline, ReplaySource};

/// Totals for one run of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub bad_frames: u64,
    pub qualifying_frames: u64,
    pub confirmations: u64,
    pub dispatched: u64,
    pub delivered: u64,
}

/// Owns the source, the pipeline and the dispatcher.
///
/// Each frame is fully processed before the next is read. Dispatches are
/// spawned and only reaped between frames, so a slow backend never stalls
/// frame processing beyond the dispatcher's own timeout.
pub struct PerceptionAgent {
    source: Box<dyn DetectionSource>,
    pipeline: Pipeline,
    dispatcher: EventDispatcher,
    frame_interval: Duration,
    in_flight: Vec<JoinHandle<Result<DispatchReceipt, DispatchError>>>,
}

impl PerceptionAgent {
    /// Build from settings; fails if the detection source is missing
    pub fn from_settings(settings: &PerceptionSettings) -> Result<Self, PerceptionError> {
        let path = settings.source.replay_path.as_deref().ok_or_else(|| {
            PerceptionError::Config("source.replay_path is not set".to_string())
        })?;
        let source = ReplaySource::open(path)?;
        let dispatcher = EventDispatcher::new(&settings.dispatch)?;

        info!(
            "Camera {} ready, confirming after {}s, cooldown {}s",
            settings.source.camera_index,
            settings.confirm.confirm_duration_secs,
            settings.limiter.cooldown_seconds
        );
        Self::new(Box::new(source), settings, dispatcher)
    }

    pub fn new(
        source: Box<dyn DetectionSource>,
        settings: &PerceptionSettings,
        dispatcher: EventDispatcher,
    ) -> Result<Self, PerceptionError> {
        Ok(Self {
            source,
            pipeline: Pipeline::new(settings)?,
            dispatcher,
            frame_interval: settings.source.frame_interval(),
            in_flight: Vec::new(),
        })
    }

    /// Process frames until the source ends, then wait for outstanding dispatches
    pub async fn run(&mut self) -> Result<RunSummary, PerceptionError> {
        let mut summary = RunSummary::default();
        info!("Ambulance detection loop started");

        loop {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e @ PerceptionError::Frame { .. }) => {
                    warn!("Skipping frame: {}", e);
                    summary.bad_frames += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            summary.frames += 1;

            let now = tokio::time::Instant::now().into_std();
            let report = self.pipeline.process(&frame, now);

            summary.qualifying_frames += u64::from(report.outcome.qualifying);
            summary.confirmations += u64::from(report.confirmed.is_some());
            if let Some(event) = report.forwarded {
                summary.dispatched += 1;
                self.in_flight.push(self.dispatcher.dispatch(event));
            }

            summary.delivered += self.reap(false).await;

            if !self.frame_interval.is_zero() {
                tokio::time::sleep(self.frame_interval).await;
            }
        }

        summary.delivered += self.reap(true).await;
        info!(
            "Detection loop finished: {} frames, {} confirmations, {} dispatched, {} delivered",
            summary.frames, summary.confirmations, summary.dispatched, summary.delivered
        );
        Ok(summary)
    }

    /// Collect finished dispatches (all of them when `wait` is set)
    async fn reap(&mut self, wait: bool) -> u64 {
        let mut delivered = 0;
        let mut pending = Vec::with_capacity(self.in_flight.len());

        for handle in self.in_flight.drain(..) {
            if !wait && !handle.is_finished() {
                pending.push(handle);
                continue;
            }
            match handle.await {
                Ok(Ok(_)) => delivered += 1,
                // already logged by the dispatcher
                Ok(Err(_)) => {}
                Err(e) => warn!("Dispatch task failed: {}", e),
            }
        }

        self.in_flight = pending;
        delivered
    }
}

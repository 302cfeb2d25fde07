//! Detector boundary

use geometry_filter::FrameDetections;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::PerceptionError;

/// Anything that yields one frame's detections at a time.
///
/// `Ok(None)` means the stream has ended. An `Err` is a per-frame failure;
/// the agent logs it and keeps reading.
pub trait DetectionSource: Send {
    fn next_frame(&mut self) -> Result<Option<FrameDetections>, PerceptionError>;
}

/// Replays recorded detector output, one JSON frame per line:
///
/// `{"width":1280,"height":720,"detections":[{"class_id":0,"confidence":0.91,"box":{"x1":..}}]}`
pub struct ReplaySource<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    /// Open a replay file; a missing file is a configuration error
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PerceptionError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PerceptionError::Config(format!("cannot open detection source {}: {}", path.display(), e))
        })?;
        info!("Replaying detections from {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead + Send> DetectionSource for ReplaySource<R> {
    fn next_frame(&mut self) -> Result<Option<FrameDetections>, PerceptionError> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|e| PerceptionError::Source(e.to_string()))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            // The whole line is consumed either way, so bad bytes only cost this frame
            let line = std::str::from_utf8(&self.buf).map_err(|e| PerceptionError::Frame {
                line: self.line_no,
                reason: format!("invalid UTF-8: {}", e),
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|e| PerceptionError::Frame {
                    line: self.line_no,
                    reason: e.to_string(),
                });
        }
    }
}

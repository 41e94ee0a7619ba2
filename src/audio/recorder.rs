use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use super::ring::SampleRing;

/// Misuse of the recording window is a caller bug, not a user-recoverable
/// condition, so it gets its own error type rather than a generic failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("already recording; stop the active window before starting another")]
    AlreadyRecording,
    #[error("not recording; start a window before stopping")]
    NotRecording,
}

/// A bounded mono clip cut from the capture stream.
#[derive(Debug, Clone)]
pub struct Clip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Clip {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Cuts clips out of the always-running capture ring.
///
/// Capture never starts or stops with the window: `start()` only notes the
/// wall-clock instant, and `stop()` takes the trailing samples the elapsed
/// time accounts for. At most one window may be active at a time.
pub struct ClipRecorder {
    ring: Arc<SampleRing>,
    sample_rate: u32,
    window_start: Option<Instant>,
}

impl ClipRecorder {
    pub fn new(ring: Arc<SampleRing>, sample_rate: u32) -> Self {
        Self {
            ring,
            sample_rate,
            window_start: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.window_start.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Open a recording window at the current instant.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if self.window_start.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }
        self.window_start = Some(Instant::now());
        Ok(())
    }

    /// Close the window and extract the clip.
    ///
    /// The clip length is round(rate x elapsed) since `start()`; the clip
    /// content is the ring's current trailing edge, not samples anchored to
    /// the start offset. If the task stalls between measuring elapsed time
    /// and snapshotting the head, the two desynchronize and the clip lands
    /// later than intended. Known fidelity hazard, kept as-is.
    pub fn stop(&mut self) -> Result<Clip, RecorderError> {
        let started = self.window_start.take().ok_or(RecorderError::NotRecording)?;

        let elapsed = started.elapsed().as_secs_f64();
        let wanted = (self.sample_rate as f64 * elapsed).round() as u64;
        let n = wanted.min(self.ring.capacity() as u64) as usize;
        debug!(elapsed_secs = elapsed, samples = n, "closing recording window");

        Ok(Clip {
            samples: self.ring.tail(n),
            sample_rate: self.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_twice_is_rejected() {
        let ring = Arc::new(SampleRing::new(1024));
        let mut rec = ClipRecorder::new(ring, 100);

        rec.start().unwrap();
        assert_eq!(rec.start(), Err(RecorderError::AlreadyRecording));
    }

    #[test]
    fn stop_without_start_is_rejected() {
        let ring = Arc::new(SampleRing::new(1024));
        let mut rec = ClipRecorder::new(ring, 100);

        assert!(matches!(rec.stop(), Err(RecorderError::NotRecording)));
    }

    #[tokio::test(start_paused = true)]
    async fn clip_length_follows_elapsed_time() {
        let ring = Arc::new(SampleRing::new(1024));
        let mut rec = ClipRecorder::new(Arc::clone(&ring), 100);

        rec.start().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        let clip = rec.stop().unwrap();

        // 2.5 s at 100 Hz
        assert_eq!(clip.samples.len(), 250);
        assert!(!rec.is_recording());
    }
}

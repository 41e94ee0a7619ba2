use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::ring::SampleRing;

/// Audio sample data (16-bit PCM, mono).
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a capture source
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// Frame size in milliseconds (affects latency)
    pub frame_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            frame_duration_ms: 100,
        }
    }
}

/// Continuous capture source.
///
/// Implementations run independently of clip windows: once started they
/// deliver frames until stopped at session teardown.
#[async_trait::async_trait]
pub trait CaptureSource: Send {
    /// Start capturing; returns the channel the frames arrive on.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing and release the device.
    async fn stop(&mut self) -> Result<()>;

    /// Whether the source is currently capturing.
    fn is_capturing(&self) -> bool;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Capture source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Default input device via cpal
    Microphone,
    /// Silence generator for tests and headless runs
    Synthetic,
}

pub struct CaptureSourceFactory;

impl CaptureSourceFactory {
    pub fn create(kind: CaptureKind, config: CaptureConfig) -> Result<Box<dyn CaptureSource>> {
        match kind {
            CaptureKind::Microphone => Ok(Box::new(super::mic::MicrophoneSource::new(config))),
            CaptureKind::Synthetic => Ok(Box::new(SyntheticSource::new(config))),
        }
    }
}

/// Drain capture frames into the session ring. Runs until the source's
/// channel closes; this is the single writer for the ring's lifetime.
pub fn pump_into_ring(
    mut frames: mpsc::Receiver<AudioFrame>,
    ring: Arc<SampleRing>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("capture pump started");
        while let Some(frame) = frames.recv().await {
            ring.write(&frame.samples);
        }
        debug!("capture pump stopped");
    })
}

/// Emits frames of silence at the configured cadence. Stands in for the
/// microphone when no device is available.
pub struct SyntheticSource {
    config: CaptureConfig,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for SyntheticSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(64);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let samples_per_frame =
            (self.config.sample_rate as u64 * self.config.frame_duration_ms / 1000) as usize;
        let frame_duration = std::time::Duration::from_millis(self.config.frame_duration_ms);
        let sample_rate = self.config.sample_rate;

        info!(sample_rate, samples_per_frame, "synthetic capture started");

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_duration);
            let mut elapsed_ms = 0u64;
            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                let frame = AudioFrame {
                    samples: vec![0i16; samples_per_frame],
                    sample_rate,
                    timestamp_ms: elapsed_ms,
                };
                elapsed_ms += frame_duration.as_millis() as u64;
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::capture::{AudioFrame, CaptureConfig, CaptureSource};

/// Default input device via cpal.
///
/// cpal streams are not `Send`, so the stream lives on a dedicated thread
/// for the whole capture; the device callback forwards frames into a tokio
/// channel. Frames are dropped rather than blocking the realtime callback
/// if the channel backs up.
pub struct MicrophoneSource {
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl MicrophoneSource {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for MicrophoneSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (tx, rx) = mpsc::channel(64);
        let capturing = Arc::clone(&self.capturing);
        capturing.store(true, Ordering::SeqCst);

        let config = self.config.clone();
        let flag = Arc::clone(&capturing);
        self.worker = Some(std::thread::spawn(move || {
            if let Err(e) = run_input_stream(config, tx, Arc::clone(&flag)) {
                warn!("microphone capture failed: {e:#}");
                flag.store(false, Ordering::SeqCst);
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            // The worker only polls the flag between sleeps; joining is quick
            // but still blocking, so move it off the runtime.
            tokio::task::spawn_blocking(move || {
                if worker.join().is_err() {
                    warn!("microphone capture thread panicked");
                }
            })
            .await
            .context("failed to join capture thread")?;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

fn log_stream_error(err: cpal::StreamError) {
    warn!("input stream error: {err}");
}

fn run_input_stream(
    config: CaptureConfig,
    tx: mpsc::Sender<AudioFrame>,
    capturing: Arc<AtomicBool>,
) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .context("no default input device")?;
    let supported = device
        .default_input_config()
        .context("failed to query default input config")?;

    info!(
        device = %device.name().unwrap_or_else(|_| "unknown".into()),
        format = ?supported.sample_format(),
        "opening input stream"
    );

    let stream_config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let sample_rate = config.sample_rate;
    let started = Instant::now();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::I16 => {
            let tx = tx.clone();
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    forward(&tx, data.to_vec(), sample_rate, started);
                },
                log_stream_error,
                None,
            )?
        }
        cpal::SampleFormat::F32 => {
            let tx = tx.clone();
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let samples = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                        .collect();
                    forward(&tx, samples, sample_rate, started);
                },
                log_stream_error,
                None,
            )?
        }
        other => anyhow::bail!("unsupported input sample format: {other:?}"),
    };

    stream.play().context("failed to start input stream")?;

    while capturing.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    drop(stream);
    info!("input stream closed");
    Ok(())
}

fn forward(tx: &mpsc::Sender<AudioFrame>, samples: Vec<i16>, sample_rate: u32, started: Instant) {
    let frame = AudioFrame {
        samples,
        sample_rate,
        timestamp_ms: started.elapsed().as_millis() as u64,
    };
    // try_send: the realtime callback must never block.
    if tx.try_send(frame).is_err() {
        warn!("capture channel full, dropping frame");
    }
}

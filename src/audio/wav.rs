use std::path::Path;

use anyhow::{Context, Result};
use hound::{WavReader, WavWriter};
use tracing::debug;

use super::recorder::Clip;

/// Write a clip as mono 16-bit PCM WAV.
pub fn save_clip(path: impl AsRef<Path>, clip: &Clip) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV file: {}", path.display()))?;
    for &sample in &clip.samples {
        writer
            .write_sample(sample)
            .context("failed to write sample to WAV")?;
    }
    writer.finalize().context("failed to finalize WAV file")?;

    debug!(
        path = %path.display(),
        seconds = clip.duration_seconds(),
        "clip written"
    );
    Ok(())
}

/// Basic facts about a WAV on disk, read back for the microphone test.
#[derive(Debug, Clone)]
pub struct WavInfo {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

pub fn probe(path: impl AsRef<Path>) -> Result<WavInfo> {
    let path = path.as_ref();
    let reader = WavReader::open(path)
        .with_context(|| format!("failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();
    let duration_seconds =
        reader.duration() as f64 / spec.sample_rate as f64;

    Ok(WavInfo {
        duration_seconds,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

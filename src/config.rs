use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use serde::Deserialize;

/// Experiment configuration. Every field has a default matching the
/// reference protocol, so a config file only needs to override what it
/// changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Experiment name; first argument to the external setup check and the
    /// top-level folder under the data root.
    pub experiment_name: String,
    pub audio: AudioConfig,
    pub timing: TimingConfig,
    pub schedule: ScheduleConfig,
    pub verification: VerificationConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment_name: "vocalization_control".to_string(),
            audio: AudioConfig::default(),
            timing: TimingConfig::default(),
            schedule: ScheduleConfig::default(),
            verification: VerificationConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Load from a config file, or fall back to the defaults when no path
    /// is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// Seconds of audio the capture ring holds; must comfortably exceed
    /// the longest clip ever extracted
    pub capture_seconds: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            capture_seconds: 600, // 10 minutes in memory
        }
    }
}

impl AudioConfig {
    pub fn ring_capacity(&self) -> usize {
        self.sample_rate as usize * self.capture_seconds as usize
    }
}

/// A uniform-random delay range in seconds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_secs_f64(rng.gen_range(self.min..=self.max))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pre-stimulus interval
    pub isi_secs: DelayRange,
    /// Stimulus display duration
    pub stimulus_secs: DelayRange,
    /// Delay between stimulus offset and recall onset
    pub pre_recall_secs: DelayRange,
    /// Recall minimum wait before the prompt appears
    pub recall_wait_secs: f64,
    /// Minimum recall duration past the wait
    pub recall_main_secs: f64,
    /// Trailing silence required to end recall
    pub recall_extra_secs: f64,
    /// Voice-activity sampling tick in milliseconds
    pub activity_tick_ms: u64,
    /// RMS fraction of full scale above which a tick counts as talking
    pub activity_threshold: f64,
    /// Pause on the block counter before the countdown
    pub block_pause_secs: f64,
    /// Countdown start value (counts down to 1, one second per step)
    pub countdown_from: u32,
    /// Open recall duration at the end of qualifying sessions
    pub final_recall_secs: u64,
    /// Microphone test record length
    pub mic_test_record_secs: u64,
    /// Microphone test playback length
    pub mic_test_playback_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            isi_secs: DelayRange { min: 0.4, max: 0.6 },
            stimulus_secs: DelayRange { min: 1.4, max: 1.8 },
            pre_recall_secs: DelayRange { min: 0.8, max: 1.2 },
            recall_wait_secs: 1.0,
            recall_main_secs: 2.0,
            recall_extra_secs: 1.0,
            activity_tick_ms: 50,
            activity_threshold: 0.015,
            block_pause_secs: 1.0,
            countdown_from: 10,
            final_recall_secs: 600,
            mic_test_record_secs: 5,
            mic_test_playback_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Trials per block; each block boundary shows the counter and countdown
    pub block_size: usize,
    /// Mandatory electrode break cadence
    pub required_break_every: usize,
    /// Sessions at or above this number end with the open recall period
    pub final_recall_min_session: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            block_size: 24,
            required_break_every: 192,
            final_recall_min_session: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// External setup checker, invoked with (experiment, participant,
    /// session); exit code 0 means verified
    pub command: PathBuf,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("sync_check"),
        }
    }
}

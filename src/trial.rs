use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::audio::{save_clip, Clip, ClipRecorder};
use crate::config::{DelayRange, TimingConfig};
use crate::cue::CueTone;
use crate::events::Event;
use crate::recall::{ActivitySignal, GateTiming, SpeechGate};
use crate::session::SessionIo;

/// Timing parameters for a single trial.
#[derive(Debug, Clone, Copy)]
pub struct TrialTiming {
    pub isi: DelayRange,
    pub stimulus: DelayRange,
    pub pre_recall: DelayRange,
    pub gate: GateTiming,
}

impl TrialTiming {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            isi: timing.isi_secs,
            stimulus: timing.stimulus_secs,
            pre_recall: timing.pre_recall_secs,
            gate: GateTiming::from_config(timing),
        }
    }
}

/// What one trial produced.
#[derive(Debug, Clone)]
pub struct TrialRecord {
    pub index: usize,
    pub word: String,
    pub practice: bool,
    pub stimulus_on: DateTime<Utc>,
    pub stimulus_off: DateTime<Utc>,
    pub recall_start: DateTime<Utc>,
    pub recall_stop: DateTime<Utc>,
    pub too_fast: bool,
    pub clip_seconds: f64,
}

/// Runs one trial's fixed phase timeline: pre-stimulus interval, stimulus,
/// recall, feedback. Trials are strictly sequential; every wait is an
/// await point, so background capture keeps filling the ring throughout.
pub struct TrialRunner {
    timing: TrialTiming,
    rng: StdRng,
    out_dir: PathBuf,
}

impl TrialRunner {
    pub fn new(timing: TrialTiming, rng: StdRng, out_dir: PathBuf) -> Self {
        Self {
            timing,
            rng,
            out_dir,
        }
    }

    pub async fn run_trial(
        &mut self,
        recorder: &mut ClipRecorder,
        io: &mut SessionIo,
        signal: &mut dyn ActivitySignal,
        word: &str,
        index: usize,
        practice: bool,
    ) -> Result<TrialRecord> {
        debug!(index, word, practice, "trial start");

        // pre-stimulus interval
        sleep(self.timing.isi.sample(&mut self.rng)).await;

        // stimulus
        io.reporter.report(Event::Stimulus {
            word: word.to_string(),
            index,
        });
        io.display.show("stimulus", word);
        let stimulus_on = Utc::now();
        sleep(self.timing.stimulus.sample(&mut self.rng)).await;
        io.reporter.report(Event::StimulusCleared {
            word: word.to_string(),
            index,
        });
        io.display.clear();
        let stimulus_off = Utc::now();

        sleep(self.timing.pre_recall.sample(&mut self.rng)).await;

        // recall
        recorder.start()?;
        io.reporter.report(Event::RecallStart {
            word: word.to_string(),
            index,
        });
        let recall_start = Utc::now();

        let mut gate = SpeechGate::new(self.timing.gate, signal);
        gate.minimum_wait(io.reporter.as_mut(), index).await;
        io.display.show("recall prompt", "******");
        gate.await_quiet().await;
        io.display.clear();
        let too_fast = gate.too_fast();

        let clip = recorder.stop()?;
        let clip_seconds = clip.duration_seconds();
        let wav_path = self.out_dir.join(artifact_name(index, practice, "wav"));
        self.persist_clip(&wav_path, &clip, io);

        // transcript line: the stimulus word, no trailing newline
        let lst_path = self.out_dir.join(artifact_name(index, practice, "lst"));
        std::fs::write(&lst_path, word)
            .with_context(|| format!("failed to write {}", lst_path.display()))?;

        io.reporter.report(Event::RecallStop {
            word: word.to_string(),
            index,
            too_fast,
        });
        let recall_stop = Utc::now();

        // feedback
        let cue_length = io.cue.play(CueTone::High);
        sleep(cue_length).await;

        Ok(TrialRecord {
            index,
            word: word.to_string(),
            practice,
            stimulus_on,
            stimulus_off,
            recall_start,
            recall_stop,
            too_fast,
            clip_seconds,
        })
    }

    /// A clip that fails to land on disk degrades to a warning; the session
    /// keeps going.
    fn persist_clip(&self, path: &Path, clip: &Clip, io: &mut SessionIo) {
        if let Err(e) = save_clip(path, clip) {
            warn!("failed to save recall clip {}: {e:#}", path.display());
        }
        if !path.exists() {
            warn!("recall clip missing after stop: {}", path.display());
            io.display.show(
                "warning message",
                "WARNING: Wav output file not detected. Sounds may not be successfully recorded to disk.",
            );
        }
    }
}

fn artifact_name(index: usize, practice: bool, extension: &str) -> String {
    if practice {
        format!("{index}_practice.{extension}")
    } else {
        format!("{index}.{extension}")
    }
}

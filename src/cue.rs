use std::time::Duration;

use tracing::info;

/// The two beeps the session uses: low arms the microphone test, high is
/// the per-trial feedback cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueTone {
    Low,
    High,
}

/// Audio-out collaborator. `play` begins playback and returns the cue's
/// duration so the sequencer can wait it out cooperatively.
pub trait CuePlayer: Send {
    fn play(&mut self, tone: CueTone) -> Duration;
}

/// Cue player for environments without audio output; announces the cue on
/// the console and reports the nominal beep durations.
pub struct ConsoleCue;

impl CuePlayer for ConsoleCue {
    fn play(&mut self, tone: CueTone) -> Duration {
        match tone {
            CueTone::Low => {
                info!("cue: low beep");
                Duration::from_millis(600)
            }
            CueTone::High => {
                info!("cue: high beep");
                Duration::from_millis(300)
            }
        }
    }
}

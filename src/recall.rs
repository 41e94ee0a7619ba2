use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::audio::SampleRing;
use crate::config::TimingConfig;
use crate::events::{Event, EventReporter};

/// Per-tick voice-activity sample: is the participant talking right now?
pub trait ActivitySignal: Send {
    fn is_talking(&mut self) -> bool;
}

impl<F: FnMut() -> bool + Send> ActivitySignal for F {
    fn is_talking(&mut self) -> bool {
        self()
    }
}

/// RMS-over-threshold activity signal reading the trailing tick window of
/// the capture ring.
pub fn rms_threshold_signal(
    ring: Arc<SampleRing>,
    sample_rate: u32,
    tick: Duration,
    threshold: f64,
) -> impl FnMut() -> bool + Send {
    let window = ((sample_rate as f64 * tick.as_secs_f64()) as usize).max(1);
    move || {
        let samples = ring.tail(window);
        if samples.is_empty() {
            return false;
        }
        let energy: f64 = samples
            .iter()
            .map(|&s| {
                let normalized = s as f64 / i16::MAX as f64;
                normalized * normalized
            })
            .sum();
        (energy / samples.len() as f64).sqrt() > threshold
    }
}

/// Gate timing parameters, in one place so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct GateTiming {
    /// Minimum wait before the recall prompt appears
    pub wait: Duration,
    /// Minimum recall duration past the wait
    pub main: Duration,
    /// Trailing silence required before recall can end
    pub extra: Duration,
    /// Sampling tick
    pub tick: Duration,
}

impl GateTiming {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            wait: Duration::from_secs_f64(timing.recall_wait_secs),
            main: Duration::from_secs_f64(timing.recall_main_secs),
            extra: Duration::from_secs_f64(timing.recall_extra_secs),
            tick: Duration::from_millis(timing.activity_tick_ms),
        }
    }
}

/// Decides when a trial's recall phase ends, from tick-sampled voice
/// activity.
///
/// Recall runs in two phases. During the minimum wait, any speech is
/// flagged (the participant answered before the prompt) but still counts
/// as having spoken. Afterwards the gate holds the phase open until the
/// participant has spoken at least once, the current tick is silent, the
/// minimum total duration has passed, and the trailing-silence debounce
/// has elapsed. A participant who never speaks holds the gate open
/// indefinitely; there is deliberately no fallback timeout.
pub struct SpeechGate<'a> {
    timing: GateTiming,
    signal: &'a mut dyn ActivitySignal,
    started: Instant,
    last_spoken: Instant,
    ever_spoken: bool,
    too_fast: bool,
}

impl<'a> SpeechGate<'a> {
    pub fn new(timing: GateTiming, signal: &'a mut dyn ActivitySignal) -> Self {
        let now = Instant::now();
        Self {
            timing,
            signal,
            started: now,
            last_spoken: now,
            ever_spoken: false,
            too_fast: false,
        }
    }

    /// Phase 1: tick through the minimum wait. Speech observed here emits a
    /// spoke-too-soon event and marks the trial too fast.
    pub async fn minimum_wait(&mut self, reporter: &mut dyn EventReporter, index: usize) {
        let mut ticks = interval(self.timing.tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.started.elapsed() < self.timing.wait {
            ticks.tick().await;
            if self.signal.is_talking() {
                self.ever_spoken = true;
                self.last_spoken = Instant::now();
                reporter.report(Event::SpokeTooSoon { index });
            }
        }
        if self.ever_spoken {
            self.too_fast = true;
        }
    }

    /// Phase 2: hold recall open until speech has both happened and ended.
    pub async fn await_quiet(&mut self) {
        let mut ticks = interval(self.timing.tick);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;
            if self.signal.is_talking() {
                self.ever_spoken = true;
                self.last_spoken = Instant::now();
                continue;
            }
            if self.ever_spoken
                && self.started.elapsed() >= self.timing.wait + self.timing.main
                && self.last_spoken.elapsed() >= self.timing.extra
            {
                return;
            }
        }
    }

    /// Whether speech was observed before the prompt appeared.
    pub fn too_fast(&self) -> bool {
        self.too_fast
    }
}

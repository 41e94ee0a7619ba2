// Shared test doubles: a display that broadcasts what it shows, an
// in-memory event log, and a prompt answerer that feeds key events the way
// a participant and researcher would.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use vocal_trials::cue::{CuePlayer, CueTone};
use vocal_trials::display::Display;
use vocal_trials::events::{Event, EventReporter};
use vocal_trials::input::{InputEvent, InputQueue, Key};
use vocal_trials::session::SessionIo;

/// Records every `show` call and forwards it to a channel so a test task
/// can react to prompts as they appear.
pub struct ScriptableDisplay {
    log: Arc<Mutex<Vec<(String, String)>>>,
    shows: mpsc::UnboundedSender<(String, String)>,
}

impl Display for ScriptableDisplay {
    fn show(&mut self, tag: &str, text: &str) {
        self.log
            .lock()
            .unwrap()
            .push((tag.to_string(), text.to_string()));
        let _ = self.shows.send((tag.to_string(), text.to_string()));
    }

    fn clear(&mut self) {}
}

pub fn scriptable_display() -> (
    ScriptableDisplay,
    Arc<Mutex<Vec<(String, String)>>>,
    mpsc::UnboundedReceiver<(String, String)>,
) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ScriptableDisplay {
            log: Arc::clone(&log),
            shows: tx,
        },
        log,
        rx,
    )
}

/// Call-order-preserving in-memory event log.
pub struct MemoryReporter {
    log: Arc<Mutex<Vec<Event>>>,
}

impl MemoryReporter {
    pub fn new() -> (Self, Arc<Mutex<Vec<Event>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl EventReporter for MemoryReporter {
    fn report(&mut self, event: Event) {
        self.log.lock().unwrap().push(event);
    }
}

/// Cue player with short fixed beeps and no audio hardware.
pub struct SilentCue;

impl CuePlayer for SilentCue {
    fn play(&mut self, _tone: CueTone) -> Duration {
        Duration::from_millis(250)
    }
}

/// Bundle the fakes into a `SessionIo`, returning the handles tests
/// assert against.
pub fn fake_io() -> (
    SessionIo,
    Arc<Mutex<Vec<(String, String)>>>,
    Arc<Mutex<Vec<Event>>>,
    mpsc::UnboundedSender<InputEvent>,
    mpsc::UnboundedReceiver<(String, String)>,
) {
    let (display, display_log, shows) = scriptable_display();
    let (reporter, event_log) = MemoryReporter::new();
    let (keys, input) = InputQueue::channel();
    let io = SessionIo {
        display: Box::new(display),
        reporter: Box::new(reporter),
        cue: Box::new(SilentCue),
        input,
    };
    (io, display_log, event_log, keys, shows)
}

/// Answer session prompts as they appear: the participant presses the keys
/// each message asks for. Press and release are sent for every answered
/// key; the SPACE+RETURN chord is pressed together before either release.
pub fn spawn_prompt_answerer(
    mut shows: mpsc::UnboundedReceiver<(String, String)>,
    keys: mpsc::UnboundedSender<InputEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some((_tag, text)) = shows.recv().await {
            let presses: &[Key] = if text.contains("Press RETURN to continue") {
                &[Key::Return]
            } else if text.contains("spacebar to record") {
                &[Key::Space]
            } else if text.contains("Did you hear the recording") {
                &[Key::Y]
            } else if text.contains("enter the practice period") {
                &[Key::Return]
            } else if text.contains("practice period is complete") {
                &[Key::Return]
            } else if text.contains("readjust the electrodes") {
                &[Key::Space, Key::Return]
            } else if text.contains("impedance window") {
                &[Key::Y]
            } else if text.contains("take ten minutes") {
                &[Key::Return]
            } else {
                continue;
            };
            for &key in presses {
                if keys.send(InputEvent::Press(key)).is_err() {
                    return;
                }
            }
            for &key in presses {
                if keys.send(InputEvent::Release(key)).is_err() {
                    return;
                }
            }
        }
    })
}

/// Activity signal that talks in short bursts with long silent stretches:
/// talking on four of every twenty ticks.
pub fn bursty_signal() -> impl FnMut() -> bool + Send {
    let mut tick = 0usize;
    move || {
        let phase = tick % 20;
        tick += 1;
        (5..9).contains(&phase)
    }
}

pub mod context;
pub mod controller;

pub use context::SessionContext;
pub use controller::{SessionController, SessionOutcome, SessionState, PRACTICE_WORDS};

use crate::cue::CuePlayer;
use crate::display::Display;
use crate::events::EventReporter;
use crate::input::InputQueue;

/// The collaborators a session talks to: what the participant sees and
/// hears, the event log, and the key queue.
pub struct SessionIo {
    pub display: Box<dyn Display>,
    pub reporter: Box<dyn EventReporter>,
    pub cue: Box<dyn CuePlayer>,
    pub input: InputQueue,
}

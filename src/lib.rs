pub mod audio;
pub mod config;
pub mod cue;
pub mod display;
pub mod events;
pub mod input;
pub mod recall;
pub mod session;
pub mod trial;
pub mod verify;
pub mod wordpool;

pub use audio::{
    pump_into_ring, AudioFrame, CaptureConfig, CaptureKind, CaptureSource, CaptureSourceFactory,
    Clip, ClipRecorder, RecorderError, SampleRing,
};
pub use config::ExperimentConfig;
pub use cue::{ConsoleCue, CuePlayer, CueTone};
pub use display::{ConsoleDisplay, Display};
pub use events::{Event, EventReporter, JsonlReporter};
pub use input::{InputEvent, InputQueue, Key};
pub use recall::{rms_threshold_signal, ActivitySignal, GateTiming, SpeechGate};
pub use session::{
    SessionContext, SessionController, SessionIo, SessionOutcome, SessionState, PRACTICE_WORDS,
};
pub use trial::{TrialRecord, TrialRunner, TrialTiming};
pub use verify::{SessionVerifier, VerifyOutcome};

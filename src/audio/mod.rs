pub mod capture;
pub mod mic;
pub mod recorder;
pub mod ring;
pub mod wav;

pub use capture::{
    pump_into_ring, AudioFrame, CaptureConfig, CaptureKind, CaptureSource, CaptureSourceFactory,
    SyntheticSource,
};
pub use mic::MicrophoneSource;
pub use recorder::{Clip, ClipRecorder, RecorderError};
pub use ring::SampleRing;
pub use wav::{probe, save_clip, WavInfo};

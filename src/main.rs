use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::ExecutableCommand;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use vocal_trials::audio::{pump_into_ring, CaptureConfig, CaptureKind, CaptureSourceFactory};
use vocal_trials::recall::rms_threshold_signal;
use vocal_trials::{
    wordpool, ClipRecorder, ConsoleCue, ConsoleDisplay, ExperimentConfig, JsonlReporter, SampleRing,
    SessionContext, SessionController, SessionIo, SessionOutcome,
};

/// Timed verbal-recall experiment controller.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Participant identifier
    #[arg(long)]
    participant: String,

    /// Session number for this participant
    #[arg(long)]
    session: u32,

    /// Newline-delimited wordpool file
    #[arg(long)]
    wordpool: PathBuf,

    /// Root directory for session artifacts
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Shuffle seed; omit to shuffle from entropy
    #[arg(long)]
    seed: Option<u64>,

    /// Config file overriding the built-in protocol timings
    #[arg(long)]
    config: Option<String>,

    /// Capture silence instead of opening the microphone
    #[arg(long)]
    synthetic_capture: bool,
}

/// Puts the terminal into raw mode with release events enabled, restoring
/// it on drop even when the session errors out.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        crossterm::terminal::enable_raw_mode().context("failed to enable raw mode")?;
        if std::io::stdout()
            .execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))
            .is_err()
        {
            warn!("terminal does not report key releases; pause-on-hold is unavailable");
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = std::io::stdout().execute(PopKeyboardEnhancementFlags);
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = ExperimentConfig::load(args.config.as_deref())?;

    let mut words = wordpool::load_wordpool(&args.wordpool)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    wordpool::shuffle(&mut rng, &mut words);

    let ctx = SessionContext::new(
        config.experiment_name.clone(),
        args.participant,
        args.session,
        args.data_dir,
    );

    // Capture runs for the whole session, independent of any clip window.
    let ring = Arc::new(SampleRing::new(config.audio.ring_capacity()));
    let kind = if args.synthetic_capture {
        CaptureKind::Synthetic
    } else {
        CaptureKind::Microphone
    };
    let mut source = CaptureSourceFactory::create(
        kind,
        CaptureConfig {
            sample_rate: config.audio.sample_rate,
            frame_duration_ms: 100,
        },
    )?;
    let frames = source.start().await.context("failed to start capture")?;
    let pump = pump_into_ring(frames, Arc::clone(&ring));

    let recorder = ClipRecorder::new(Arc::clone(&ring), config.audio.sample_rate);
    let signal = rms_threshold_signal(
        Arc::clone(&ring),
        config.audio.sample_rate,
        Duration::from_millis(config.timing.activity_tick_ms),
        config.timing.activity_threshold,
    );

    let _terminal = TerminalGuard::enter()?;
    let io = SessionIo {
        display: Box::new(ConsoleDisplay),
        reporter: Box::new(JsonlReporter::at(
            ctx.session_dir().join("session_events.jsonl"),
        )),
        cue: Box::new(ConsoleCue),
        input: vocal_trials::input::spawn_terminal_input(),
    };

    let mut controller =
        SessionController::new(ctx, config, words, io, recorder, Box::new(signal), rng);
    let outcome = controller.run().await;
    drop(_terminal);
    let outcome = outcome?;

    source.stop().await.context("failed to stop capture")?;
    pump.abort();

    match outcome {
        SessionOutcome::Complete => info!("session finished"),
        SessionOutcome::Aborted => {
            warn!("session aborted");
            std::process::exit(1);
        }
    }
    Ok(())
}

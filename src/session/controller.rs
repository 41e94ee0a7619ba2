use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::audio::{probe, save_clip, ClipRecorder};
use crate::config::ExperimentConfig;
use crate::cue::CueTone;
use crate::events::Event;
use crate::input::Key;
use crate::recall::ActivitySignal;
use crate::trial::{TrialRunner, TrialTiming};
use crate::verify::SessionVerifier;

use super::context::SessionContext;
use super::SessionIo;

const INSTRUCTIONS_MESSAGE: &str = "We will now review the basics of the study, and the experimenter will answer any questions that you have.\n\n1) Words will come onscreen one at a time.\n\n2) After each word, you will see a row of asterisks. While the asterisks are on the screen, say the word you just saw.\n\n3) You may hold down the SPACE BAR to pause the task and take breaks, and RETURN to resume.\n\nIt is very important for you to try to avoid all unnecessary motion while engaged in the study. Please try to limit these activities to the time during the breaks.\n\nYou are now ready to begin the study!\n\nIf you have any remaining questions, please ask the experimenter now.\n\nOtherwise, press RETURN to enter the practice period.";

const BREAK_MESSAGE: &str = "We will now take some time\nto readjust the electrodes.\nWhen it is time to continue,\npress SPACE and RETURN.";

const EXPERIMENTER_MESSAGE: &str =
    "Researcher: Please confirm that the impedance window is closed and that sync pulses are showing.";

const FINAL_RECALL_MESSAGE: &str = "The vocalization testing is now complete.\n\nTo finish the session, please take ten minutes to repeat any words that you remember saying today.\n\nPress RETURN to begin.";

pub const PRACTICE_WORDS: [&str; 10] = [
    "RHINO",
    "BEAM",
    "DOG",
    "WATERMELON",
    "FLOOD",
    "MIRROR",
    "COTTON",
    "IMAGE",
    "RING",
    "VIOLIN",
];

/// Session phases. Terminal states have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    EnterParticipantId,
    ConfirmSetup,
    VerifyingExternal,
    MicrophoneTest,
    Instructions,
    Practice,
    MainLoop,
    FinalRecall,
    Complete,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Complete,
    Aborted,
}

/// Drives a whole session: checkpoints, practice, the main trial loop with
/// its break cadence, and the closing open-recall period.
pub struct SessionController {
    ctx: SessionContext,
    config: ExperimentConfig,
    words: Vec<String>,
    io: SessionIo,
    recorder: ClipRecorder,
    signal: Box<dyn ActivitySignal>,
    verifier: SessionVerifier,
    trials: TrialRunner,
}

impl SessionController {
    pub fn new(
        ctx: SessionContext,
        config: ExperimentConfig,
        words: Vec<String>,
        io: SessionIo,
        recorder: ClipRecorder,
        signal: Box<dyn ActivitySignal>,
        rng: rand::rngs::StdRng,
    ) -> Self {
        let trials = TrialRunner::new(
            TrialTiming::from_config(&config.timing),
            rng,
            ctx.session_dir(),
        );
        let verifier = SessionVerifier::new(config.verification.command.clone());
        Self {
            ctx,
            config,
            words,
            io,
            recorder,
            signal,
            verifier,
            trials,
        }
    }

    /// Run the state machine to a terminal state.
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        let mut state = SessionState::Idle;
        loop {
            debug!(?state, "session state");
            state = match state {
                SessionState::Idle => SessionState::EnterParticipantId,
                SessionState::EnterParticipantId => self.enter_participant().await?,
                SessionState::ConfirmSetup => self.confirm_setup().await?,
                SessionState::VerifyingExternal => self.verify_setup().await?,
                SessionState::MicrophoneTest => self.microphone_test().await?,
                SessionState::Instructions => self.instructions().await?,
                SessionState::Practice => self.practice_block().await?,
                SessionState::MainLoop => self.main_loop().await?,
                SessionState::FinalRecall => self.final_recall().await?,
                SessionState::Complete => {
                    self.io.reporter.report(Event::SessionEnd);
                    self.io
                        .display
                        .show("end message", "Yay, the session is over!");
                    info!("session complete");
                    return Ok(SessionOutcome::Complete);
                }
                SessionState::Aborted => {
                    warn!("session aborted");
                    return Ok(SessionOutcome::Aborted);
                }
            };
        }
    }

    async fn enter_participant(&mut self) -> Result<SessionState> {
        let session_dir = self.ctx.session_dir();
        if session_dir.exists() {
            self.io.display.show(
                "duplicate message",
                "That participant has already completed this session.",
            );
            sleep(Duration::from_secs(3)).await;
            self.io.display.clear();
            return Ok(SessionState::Aborted);
        }
        std::fs::create_dir_all(&session_dir)
            .with_context(|| format!("failed to create {}", session_dir.display()))?;

        info!(
            participant = %self.ctx.participant,
            session = self.ctx.session_number,
            dir = %session_dir.display(),
            "session storage created"
        );
        self.io.reporter.report(Event::SessionStart {
            participant: self.ctx.participant.clone(),
            session: self.ctx.session_number,
        });
        Ok(SessionState::ConfirmSetup)
    }

    async fn confirm_setup(&mut self) -> Result<SessionState> {
        self.io.display.show(
            "setup confirmation",
            &format!(
                "Experiment: {}\nParticipant: {}\nSession: {}\nTrials: {}\n\nPress RETURN to continue.",
                self.ctx.experiment,
                self.ctx.participant,
                self.ctx.session_number,
                self.words.len()
            ),
        );
        self.io.input.wait_for_press(Key::Return).await?;
        self.io.display.clear();
        Ok(SessionState::VerifyingExternal)
    }

    async fn verify_setup(&mut self) -> Result<SessionState> {
        self.verifier.verify(&self.ctx, &mut self.io).await?;
        Ok(SessionState::MicrophoneTest)
    }

    /// Record-and-play-back loop until the researcher accepts the level, or
    /// cancels the session outright.
    async fn microphone_test(&mut self) -> Result<SessionState> {
        self.io.reporter.report(Event::MicrophoneTestBegin);

        let record_length = Duration::from_secs(self.config.timing.mic_test_record_secs);
        let playback_length = Duration::from_secs(self.config.timing.mic_test_playback_secs);
        let wav_path;

        loop {
            self.io.display.show(
                "microphone test prompt",
                "Press the spacebar to record a sound after the beep.",
            );
            self.io.input.wait_for_press(Key::Space).await?;
            self.io.display.clear();

            let beep_length = self.io.cue.play(CueTone::Low);
            sleep(beep_length).await;

            self.io
                .display
                .show("microphone test recording", "Recording...");
            let path = self.ctx.session_dir().join(format!(
                "microphone_test_{}.wav",
                Utc::now().format("%Y-%m-%d_%H_%M_%S")
            ));
            self.recorder.start()?;
            sleep(record_length).await;
            let clip = self.recorder.stop()?;
            if let Err(e) = save_clip(&path, &clip) {
                warn!("failed to save microphone test clip: {e:#}");
            }
            self.io.display.clear();

            sleep(Duration::from_secs(1)).await;

            self.io
                .display
                .show("microphone test playing", "Playing...");
            match probe(&path) {
                Ok(wav) => debug!(seconds = wav.duration_seconds, "playing test clip"),
                Err(e) => warn!("could not read back test clip: {e:#}"),
            }
            sleep(playback_length).await;
            self.io.display.clear();

            self.io.display.show(
                "microphone test confirmation",
                "Did you hear the recording? \n(Y=Continue / N=Try Again / C=Cancel).",
            );
            let choice = self
                .io
                .input
                .wait_for_any_press(&[Key::Y, Key::N, Key::C])
                .await?;
            self.io.display.clear();

            match choice {
                Key::C => {
                    self.io.reporter.report(Event::MicrophoneTestEnd);
                    return Ok(SessionState::Aborted);
                }
                Key::N => continue,
                _ => {
                    wav_path = path;
                    break;
                }
            }
        }

        // A missing file degrades to a warning; the session keeps going.
        if !wav_path.exists() {
            self.io.display.show(
                "warning message",
                "WARNING: Wav output file not detected.  Sounds may not be successfully recorded to disk.",
            );
            self.io.input.wait_for_press(Key::Return).await?;
            self.io.display.clear();
        }

        self.io.reporter.report(Event::MicrophoneTestEnd);
        Ok(SessionState::Instructions)
    }

    async fn instructions(&mut self) -> Result<SessionState> {
        self.io
            .display
            .show("instructions message", INSTRUCTIONS_MESSAGE);
        self.io.input.wait_for_press(Key::Return).await?;
        self.io.display.clear();
        Ok(SessionState::Practice)
    }

    async fn practice_block(&mut self) -> Result<SessionState> {
        for (index, word) in PRACTICE_WORDS.iter().enumerate() {
            self.run_one_trial(word, index, true).await?;
            self.voluntary_pause().await?;
        }

        self.io.display.show(
            "practice complete",
            "The practice period is complete.  Press RETURN to begin your session.",
        );
        self.io.input.wait_for_press(Key::Return).await?;
        self.io.display.clear();
        Ok(SessionState::MainLoop)
    }

    async fn main_loop(&mut self) -> Result<SessionState> {
        let total = self.words.len();
        for index in 0..total {
            self.voluntary_pause().await?;

            if index % self.config.schedule.required_break_every == 0 && index != 0 {
                self.required_break(index).await?;
            }
            if index % self.config.schedule.block_size == 0 {
                self.block_countdown(index, total).await?;
            }

            let word = self.words[index].clone();
            self.run_one_trial(&word, index, false).await?;
        }

        if self.ctx.session_number >= self.config.schedule.final_recall_min_session {
            Ok(SessionState::FinalRecall)
        } else {
            Ok(SessionState::Complete)
        }
    }

    async fn final_recall(&mut self) -> Result<SessionState> {
        self.io
            .display
            .show("final recall instructions", FINAL_RECALL_MESSAGE);
        self.io.input.wait_for_press(Key::Return).await?;
        self.io.display.clear();

        self.recorder.start()?;
        self.io.reporter.report(Event::FinalRecallStart);
        self.io.display.show("final recall prompt", "******");
        sleep(Duration::from_secs(self.config.timing.final_recall_secs)).await;
        self.io.display.clear();
        self.io.reporter.report(Event::FinalRecallStop);
        let clip = self.recorder.stop()?;

        let path = self.ctx.session_dir().join("final_recall.wav");
        if let Err(e) = save_clip(&path, &clip) {
            warn!("failed to save final recall clip: {e:#}");
            self.io.display.show(
                "warning message",
                "WARNING: Wav output file not detected.  Sounds may not be successfully recorded to disk.",
            );
        }

        Ok(SessionState::Complete)
    }

    async fn run_one_trial(&mut self, word: &str, index: usize, practice: bool) -> Result<()> {
        let record = self
            .trials
            .run_trial(
                &mut self.recorder,
                &mut self.io,
                self.signal.as_mut(),
                word,
                index,
                practice,
            )
            .await?;
        debug!(
            index = record.index,
            too_fast = record.too_fast,
            clip_seconds = record.clip_seconds,
            "trial finished"
        );
        Ok(())
    }

    /// Holding SPACE after a trial requests a rest; RETURN resumes.
    async fn voluntary_pause(&mut self) -> Result<()> {
        if self.io.input.is_held(Key::Space) {
            self.io.reporter.report(Event::BreakStart);
            self.io.display.show("resting message", "Resting...");
            self.io.input.wait_for_press(Key::Return).await?;
            self.io.display.clear();
            self.io.reporter.report(Event::BreakStop);
        }
        Ok(())
    }

    /// Electrode-adjustment break: participant confirms with SPACE+RETURN
    /// held together, then the researcher confirms with Y.
    async fn required_break(&mut self, index: usize) -> Result<()> {
        info!(index, "required break");
        self.io.reporter.report(Event::RequiredBreakStart { index });

        self.io.display.show("break message", BREAK_MESSAGE);
        self.io
            .input
            .wait_until_all_held(&[Key::Space, Key::Return])
            .await?;
        self.io.display.clear();

        self.io
            .display
            .show("experimenter message", EXPERIMENTER_MESSAGE);
        self.io.input.wait_for_press(Key::Y).await?;
        self.io.display.clear();

        self.io.reporter.report(Event::RequiredBreakStop { index });
        Ok(())
    }

    async fn block_countdown(&mut self, index: usize, total: usize) -> Result<()> {
        let block = index / self.config.schedule.block_size + 1;
        let blocks = total.div_ceil(self.config.schedule.block_size);
        self.io.reporter.report(Event::BlockCountdown { index });

        self.io
            .display
            .show("block counter", &format!("Block {block} of {blocks}"));
        sleep(Duration::from_secs_f64(self.config.timing.block_pause_secs)).await;
        self.io.display.clear();

        for remaining in (1..=self.config.timing.countdown_from).rev() {
            self.io.display.show("countdown", &remaining.to_string());
            sleep(Duration::from_secs(1)).await;
        }
        self.io.display.clear();
        Ok(())
    }
}

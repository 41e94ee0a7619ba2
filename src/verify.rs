use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{info, warn};

use crate::events::Event;
use crate::input::Key;
use crate::session::{SessionContext, SessionIo};

/// How verification concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// The researcher chose to proceed without a passing check.
    Skipped,
}

/// Wraps the external setup checker (sync pulses, impedance) with
/// unbounded retry semantics.
///
/// A missing checker executable is a precondition failure, not a failed
/// check: it only offers retry, never skip. A nonzero exit offers both.
/// The child is awaited cooperatively, so the capture pump keeps running
/// while the check executes; invocations are strictly sequential.
pub struct SessionVerifier {
    command: PathBuf,
}

impl SessionVerifier {
    pub fn new(command: PathBuf) -> Self {
        Self { command }
    }

    pub async fn verify(&self, ctx: &SessionContext, io: &mut SessionIo) -> Result<VerifyOutcome> {
        while !self.command.exists() {
            warn!("setup checker not found at {}", self.command.display());
            io.display.show(
                "verification missing",
                &format!(
                    "Setup checker not found at {}.\nInstall it, then press RETURN to look again.",
                    self.command.display()
                ),
            );
            io.input.wait_for_press(Key::Return).await?;
            io.display.clear();
        }

        loop {
            io.display
                .show("verification running", "Checking the recording setup...");
            let status = Command::new(&self.command)
                .arg(&ctx.experiment)
                .arg(&ctx.participant)
                .arg(ctx.session_number.to_string())
                .status()
                .await
                .with_context(|| format!("failed to launch {}", self.command.display()))?;
            io.display.clear();

            if status.success() {
                info!("setup verification passed");
                return Ok(VerifyOutcome::Verified);
            }

            warn!("setup verification failed: {status}");
            io.display.show(
                "verification failed",
                "Setup check failed.\nPress Y to retry, or N to continue without verification.",
            );
            let choice = io.input.wait_for_any_press(&[Key::Y, Key::N]).await?;
            io.display.clear();

            if choice == Key::N {
                io.reporter.report(Event::VerificationSkipped {
                    participant: ctx.participant.clone(),
                    session: ctx.session_number,
                });
                warn!("verification skipped by researcher override");
                return Ok(VerifyOutcome::Skipped);
            }
        }
    }
}

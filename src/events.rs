use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Everything the session can report, with typed fields per kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Event {
    SessionStart { participant: String, session: u32 },
    SessionEnd,
    MicrophoneTestBegin,
    MicrophoneTestEnd,
    VerificationSkipped { participant: String, session: u32 },
    Stimulus { word: String, index: usize },
    StimulusCleared { word: String, index: usize },
    RecallStart { word: String, index: usize },
    RecallStop { word: String, index: usize, too_fast: bool },
    SpokeTooSoon { index: usize },
    BreakStart,
    BreakStop,
    RequiredBreakStart { index: usize },
    RequiredBreakStop { index: usize },
    BlockCountdown { index: usize },
    FinalRecallStart,
    FinalRecallStop,
}

/// Append-only event sink; implementations must preserve call order and
/// stamp each event at report time.
pub trait EventReporter: Send {
    fn report(&mut self, event: Event);
}

#[derive(Serialize)]
struct TimedEvent {
    time: DateTime<Utc>,
    #[serde(flatten)]
    event: Event,
}

/// JSON-lines event log, one object per report call.
///
/// The file is opened lazily on the first report so the reporter can be
/// constructed before the session directory exists (it is only created
/// after the duplicate-session check passes).
pub struct JsonlReporter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonlReporter {
    pub fn at(path: PathBuf) -> Self {
        Self { path, writer: None }
    }

    fn open(&mut self) -> std::io::Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::options().create(true).append(true).open(&self.path)?;
            self.writer = Some(BufWriter::new(file));
        }
        Ok(self.writer.as_mut().unwrap())
    }
}

impl EventReporter for JsonlReporter {
    fn report(&mut self, event: Event) {
        let record = TimedEvent {
            time: Utc::now(),
            event,
        };
        let result = self.open().and_then(|writer| {
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
            writer.flush()
        });
        if let Err(e) = result {
            // Logging must never take the session down.
            warn!("failed to append event to {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_name_tag() {
        let json = serde_json::to_string(&Event::RecallStop {
            word: "RHINO".into(),
            index: 3,
            too_fast: true,
        })
        .unwrap();

        assert_eq!(
            json,
            r#"{"name":"recall_stop","word":"RHINO","index":3,"too_fast":true}"#
        );
    }

    #[test]
    fn jsonl_reporter_appends_one_line_per_event() {
        let dir = tempfile::TempDir::new().unwrap();
        // The parent does not exist yet; the reporter creates it lazily.
        let path = dir.path().join("session_7").join("session_events.jsonl");

        let mut reporter = JsonlReporter::at(path.clone());
        reporter.report(Event::MicrophoneTestBegin);
        reporter.report(Event::MicrophoneTestEnd);

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("microphone_test_begin"));
        assert!(lines[1].contains("microphone_test_end"));
        assert!(lines[0].contains("\"time\":"));
    }
}

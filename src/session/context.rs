use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Who and what this session is. Created once at entry and threaded
/// through every component that needs it; immutable thereafter.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub experiment: String,
    pub participant: String,
    pub session_number: u32,
    pub start_time: DateTime<Utc>,
    data_root: PathBuf,
}

impl SessionContext {
    pub fn new(
        experiment: impl Into<String>,
        participant: impl Into<String>,
        session_number: u32,
        data_root: PathBuf,
    ) -> Self {
        Self {
            experiment: experiment.into(),
            participant: participant.into(),
            session_number,
            start_time: Utc::now(),
            data_root,
        }
    }

    pub fn participant_dir(&self) -> PathBuf {
        self.data_root.join(&self.experiment).join(&self.participant)
    }

    /// Where this session's artifacts land. Its prior existence means the
    /// participant already ran this session.
    pub fn session_dir(&self) -> PathBuf {
        self.participant_dir()
            .join(format!("session_{}", self.session_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_nest_experiment_participant_session() {
        let ctx = SessionContext::new("vocalization_control", "LTP001", 3, PathBuf::from("/data"));

        assert_eq!(
            ctx.session_dir(),
            PathBuf::from("/data/vocalization_control/LTP001/session_3")
        );
    }
}

// src/types/outcome.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::answer::QuestionAnswerLog;

/// Terminal status handed back to whoever started the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplicationStatus {
    /// Submit was clicked and the address changed afterwards.
    Success,
    /// Reached the review page but did not (or could not) submit.
    Review,
    Failed,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Success => "Success",
            ApplicationStatus::Review => "Review",
            ApplicationStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardOutcome {
    pub status: ApplicationStatus,
    pub answers: QuestionAnswerLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    pub iterations: usize,
    pub finished_at: DateTime<Utc>,
}

impl WizardOutcome {
    pub fn new(status: ApplicationStatus, answers: QuestionAnswerLog, iterations: usize) -> Self {
        Self {
            status,
            answers,
            snapshot: None,
            iterations,
            finished_at: Utc::now(),
        }
    }

    /// Outcome for a run that never got past opening the application.
    pub fn failed_to_open() -> Self {
        Self::new(ApplicationStatus::Failed, QuestionAnswerLog::new(), 0)
    }

    pub fn with_snapshot(mut self, snapshot: Option<PathBuf>) -> Self {
        self.snapshot = snapshot;
        self
    }
}

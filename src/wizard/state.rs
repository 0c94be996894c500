// src/wizard/state.rs
use std::collections::HashSet;
use std::fmt;

use crate::types::QuestionAnswerLog;
use crate::utils::contains_ignore_case;

/// Wizard step, derived from the current address alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardState {
    Resume,
    Questions,
    Documents,
    Review,
    Other,
}

impl WizardState {
    pub fn as_str(self) -> &'static str {
        match self {
            WizardState::Resume => "resume",
            WizardState::Questions => "questions",
            WizardState::Documents => "documents",
            WizardState::Review => "review",
            WizardState::Other => "other",
        }
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait PageClassifier: Send + Sync {
    fn classify(&self, url: &str) -> WizardState;
}

/// Substring classification, first match wins: review, question(s), resume, documents.
#[derive(Debug, Clone, Default)]
pub struct UrlClassifier;

impl PageClassifier for UrlClassifier {
    fn classify(&self, url: &str) -> WizardState {
        if contains_ignore_case(url, "review") {
            WizardState::Review
        } else if contains_ignore_case(url, "question") {
            WizardState::Questions
        } else if contains_ignore_case(url, "resume") {
            WizardState::Resume
        } else if contains_ignore_case(url, "documents") {
            WizardState::Documents
        } else {
            WizardState::Other
        }
    }
}

/// Progress bookkeeping for one wizard run.
#[derive(Debug, Clone)]
pub struct WizardRun {
    processed_page_keys: HashSet<String>,
    resume_attempted_page_keys: HashSet<String>,
    retried_page_keys: HashSet<String>,
    stagnation_count: u32,
    max_stagnation: u32,
    iterations: usize,
    log: QuestionAnswerLog,
}

impl WizardRun {
    pub fn new(max_stagnation: u32) -> Self {
        Self {
            processed_page_keys: HashSet::new(),
            resume_attempted_page_keys: HashSet::new(),
            retried_page_keys: HashSet::new(),
            stagnation_count: 0,
            max_stagnation: max_stagnation.max(1),
            iterations: 0,
            log: QuestionAnswerLog::new(),
        }
    }

    /// True the first time a page key is seen.
    pub fn mark_processed(&mut self, key: &str) -> bool {
        self.processed_page_keys.insert(key.to_string())
    }

    pub fn is_processed(&self, key: &str) -> bool {
        self.processed_page_keys.contains(key)
    }

    pub fn mark_resume_attempted(&mut self, key: &str) -> bool {
        self.resume_attempted_page_keys.insert(key.to_string())
    }

    /// Consume the single retry of a page. False when it was already used.
    pub fn take_retry(&mut self, key: &str) -> bool {
        self.retried_page_keys.insert(key.to_string())
    }

    pub fn progressed(&mut self) {
        self.stagnation_count = 0;
    }

    pub fn stalled(&mut self) {
        self.stagnation_count += 1;
    }

    pub fn is_stagnant(&self) -> bool {
        self.stagnation_count >= self.max_stagnation
    }

    pub fn stagnation_count(&self) -> u32 {
        self.stagnation_count
    }

    pub fn tick(&mut self) -> usize {
        self.iterations += 1;
        self.iterations
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn record_answers(&mut self, audit: QuestionAnswerLog) {
        self.log.merge(audit);
    }

    pub fn log(&self) -> &QuestionAnswerLog {
        &self.log
    }

    pub fn into_log(self) -> QuestionAnswerLog {
        self.log
    }
}

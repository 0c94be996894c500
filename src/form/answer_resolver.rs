// src/form/answer_resolver.rs
//! Asks the oracle for answers to a detected field list and renders the audit log.
//!
//! Oracle failures never escape: they become an empty `Resolution` flagged `NoAnswer`,
//! which the wizard treats as "nothing filled this round".

use std::collections::HashSet;
use std::sync::Arc;

use crate::app_log;
use crate::oracle::{FieldDescriptor, Oracle, OracleRequest};
use crate::types::{AnswerSet, Field, FieldKind, QuestionAnswerLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    Answered,
    NoAnswer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub answers: AnswerSet,
    pub audit: QuestionAnswerLog,
    pub status: ResolutionStatus,
}

impl Resolution {
    pub fn no_answer() -> Self {
        Self {
            answers: AnswerSet::new(),
            audit: QuestionAnswerLog::new(),
            status: ResolutionStatus::NoAnswer,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == ResolutionStatus::Answered
    }
}

pub struct AnswerResolver {
    oracle: Arc<dyn Oracle>,
}

impl AnswerResolver {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    pub async fn resolve(&self, profile: &str, fields: &[Field]) -> Resolution {
        let request = build_request(profile, fields);
        if request.legal_ids.is_empty() {
            app_log!(info, "No answerable fields on this page, skipping oracle");
            return Resolution::no_answer();
        }

        let raw = match self.oracle.answer(&request).await {
            Ok(answers) => answers,
            Err(e) => {
                app_log!(warn, "Oracle failed, continuing without answers: {}", e);
                return Resolution::no_answer();
            }
        };

        let legal: HashSet<&str> = request.legal_ids.iter().map(String::as_str).collect();
        let mut answers = AnswerSet::new();
        for answer in raw {
            if legal.contains(answer.identifier.as_str()) {
                answers.insert(answer);
            } else {
                app_log!(warn, "Dropping answer for unknown identifier {}", answer.identifier);
            }
        }

        if answers.is_empty() {
            return Resolution::no_answer();
        }

        let audit = audit_log(fields, &answers);
        app_log!(
            info,
            "Resolved {} answer(s) covering {} question(s)",
            answers.len(),
            audit.len()
        );

        Resolution {
            answers,
            audit,
            status: ResolutionStatus::Answered,
        }
    }
}

/// Field context plus the de-duplicated legal identifier set, in field order.
pub fn build_request(profile: &str, fields: &[Field]) -> OracleRequest {
    let mut seen = HashSet::new();
    let mut legal_ids = Vec::new();

    for field in fields {
        for id in field.answerable_identifiers() {
            if !id.is_empty() && seen.insert(id) {
                legal_ids.push(id.to_string());
            }
        }
    }

    OracleRequest {
        profile: profile.to_string(),
        fields: fields.iter().map(FieldDescriptor::from).collect(),
        legal_ids,
    }
}

/// Scalar answers log under the field label; a radio group logs the label of the option
/// the executor will pick, i.e. the first answered option in detection order.
pub fn audit_log(fields: &[Field], answers: &AnswerSet) -> QuestionAnswerLog {
    let mut log = QuestionAnswerLog::new();

    for field in fields {
        match field.kind {
            FieldKind::RadioGroup => {
                if let Some(option) = field
                    .options
                    .iter()
                    .find(|o| answers.contains(&o.identifier))
                {
                    log.record(field.label.clone(), option.label.clone());
                }
            }
            _ => {
                if let Some(value) = answers.get(&field.identifier) {
                    log.record(field.label.clone(), value.as_audit_text());
                }
            }
        }
    }

    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::types::{Answer, AnswerValue, FieldOption};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubOracle {
        reply: Mutex<Option<Result<Vec<Answer>, OracleError>>>,
        seen: Mutex<Vec<OracleRequest>>,
    }

    impl StubOracle {
        fn replying(reply: Result<Vec<Answer>, OracleError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Oracle for StubOracle {
        async fn answer(&self, request: &OracleRequest) -> Result<Vec<Answer>, OracleError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(OracleError::Empty))
        }
    }

    fn fields() -> Vec<Field> {
        vec![
            Field::scalar("text-question-input-1", FieldKind::Text, "Years of Rust?"),
            Field::choice(
                "radio-group:q2",
                FieldKind::RadioGroup,
                "Authorized to work?",
                vec![
                    FieldOption::new("single-select-question-:r2:-0", "Yes"),
                    FieldOption::new("single-select-question-:r2:-1", "No"),
                ],
            ),
            Field::scalar("text-question-input-3", FieldKind::Text, "Driving licence?"),
            Field::scalar("text-question-input-1", FieldKind::Text, "Years of Rust?"),
        ]
    }

    #[test]
    fn test_legal_ids_are_deduplicated_and_exclude_group_keys() {
        let request = build_request("profile", &fields());
        assert_eq!(
            request.legal_ids,
            vec![
                "text-question-input-1",
                "single-select-question-:r2:-0",
                "single-select-question-:r2:-1",
                "text-question-input-3",
            ]
        );
        assert!(!request.legal_ids.contains(&"radio-group:q2".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_renders_audit_and_drops_illegal_ids() {
        let oracle = StubOracle::replying(Ok(vec![
            Answer::new("text-question-input-1", AnswerValue::Number(6.0)),
            Answer::new("single-select-question-:r2:-1", true),
            Answer::new("text-question-input-3", false),
            Answer::new("radio-group:q2", "Yes"),
        ]));
        let resolver = AnswerResolver::new(oracle.clone());

        let resolution = resolver.resolve("profile", &fields()).await;

        assert!(resolution.is_answered());
        assert_eq!(resolution.answers.len(), 3);
        assert!(!resolution.answers.contains("radio-group:q2"));
        assert_eq!(resolution.audit.get("Years of Rust?"), Some("6"));
        assert_eq!(resolution.audit.get("Authorized to work?"), Some("No"));
        assert_eq!(resolution.audit.get("Driving licence?"), Some("No"));
        assert_eq!(oracle.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_no_answer() {
        let oracle = StubOracle::replying(Err(OracleError::Api {
            status: 500,
            message: "boom".to_string(),
        }));
        let resolution = AnswerResolver::new(oracle).resolve("profile", &fields()).await;

        assert_eq!(resolution.status, ResolutionStatus::NoAnswer);
        assert!(resolution.answers.is_empty());
        assert!(resolution.audit.is_empty());
    }

    #[tokio::test]
    async fn test_only_illegal_answers_is_no_answer() {
        let oracle = StubOracle::replying(Ok(vec![Answer::new("made-up", "x")]));
        let resolution = AnswerResolver::new(oracle).resolve("profile", &fields()).await;
        assert!(!resolution.is_answered());
    }

    #[tokio::test]
    async fn test_no_fields_skips_oracle() {
        let oracle = StubOracle::replying(Ok(vec![]));
        let resolution = AnswerResolver::new(oracle.clone()).resolve("profile", &[]).await;

        assert!(!resolution.is_answered());
        assert!(oracle.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_audit_uses_first_answered_radio_option() {
        let answers: AnswerSet = vec![
            Answer::new("single-select-question-:r2:-1", "selected"),
            Answer::new("single-select-question-:r2:-0", "selected"),
        ]
        .into_iter()
        .collect();

        let log = audit_log(&fields(), &answers);
        assert_eq!(log.get("Authorized to work?"), Some("Yes"));
    }
}

// src/oracle/mod.rs
//! The answer oracle: profile + field descriptors in, identifier-keyed answers out.

pub mod openai_client;
pub mod prompts;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::types::{Answer, Field, FieldKind};

pub use openai_client::OpenAiOracle;

/// Compact per-field context sent to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
}

impl From<&Field> for FieldDescriptor {
    fn from(field: &Field) -> Self {
        let options = match field.kind {
            // Dropdowns are answered by visible label.
            FieldKind::SingleSelect => field
                .valid_option_labels()
                .into_iter()
                .map(|label| OptionDescriptor { id: None, label })
                .collect(),
            FieldKind::RadioGroup => field
                .options
                .iter()
                .map(|o| OptionDescriptor {
                    id: Some(o.identifier.clone()),
                    label: o.label.trim().to_string(),
                })
                .collect(),
            FieldKind::Text | FieldKind::Textarea => Vec::new(),
        };

        Self {
            id: field.identifier.clone(),
            kind: field.kind,
            label: field.label.clone(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleRequest {
    pub profile: String,
    pub fields: Vec<FieldDescriptor>,
    /// Closed, de-duplicated set of identifiers the oracle may answer for.
    pub legal_ids: Vec<String>,
}

/// Answering behavior that belongs to the oracle, not to the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OraclePolicy {
    pub fabricate_missing: bool,
    pub favorable_yes_no: bool,
}

impl Default for OraclePolicy {
    fn default() -> Self {
        Self {
            fabricate_missing: true,
            favorable_yes_no: false,
        }
    }
}

impl From<&OracleConfig> for OraclePolicy {
    fn from(config: &OracleConfig) -> Self {
        Self {
            fabricate_missing: config.fabricate_missing,
            favorable_yes_no: config.favorable_yes_no,
        }
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn answer(&self, request: &OracleRequest) -> Result<Vec<Answer>, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldOption;

    #[test]
    fn test_descriptor_shapes() {
        let select = Field::choice(
            "single-select-question-1",
            FieldKind::SingleSelect,
            "Education",
            vec![
                FieldOption::new("", "Select").with_value(""),
                FieldOption::new("", "BSc").with_value("1"),
            ],
        );
        let radio = Field::choice(
            "radio-group:q2",
            FieldKind::RadioGroup,
            "Relocate?",
            vec![FieldOption::new("single-select-question-:r2:-0", " Yes ")],
        );

        let json = serde_json::to_value(vec![
            FieldDescriptor::from(&select),
            FieldDescriptor::from(&radio),
        ])
        .unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                {"id": "single-select-question-1", "type": "single-select", "label": "Education",
                 "options": [{"label": "BSc"}]},
                {"id": "radio-group:q2", "type": "radio-group", "label": "Relocate?",
                 "options": [{"id": "single-select-question-:r2:-0", "label": "Yes"}]}
            ])
        );
    }

    #[test]
    fn test_policy_from_config() {
        let config = OracleConfig {
            favorable_yes_no: true,
            ..OracleConfig::default()
        };
        let policy = OraclePolicy::from(&config);
        assert!(policy.fabricate_missing);
        assert!(policy.favorable_yes_no);
    }
}

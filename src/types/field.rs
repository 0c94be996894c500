// src/types/field.rs
//! Fillable form fields as seen by the detector, resolver and executor

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    SingleSelect,
    RadioGroup,
}

impl FieldKind {
    pub fn is_choice(self) -> bool {
        matches!(self, FieldKind::SingleSelect | FieldKind::RadioGroup)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::SingleSelect => "single-select",
            FieldKind::RadioGroup => "radio-group",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One presented choice of a dropdown or radio group.
///
/// Dropdown options may have an empty `identifier`; radio options never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub identifier: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FieldOption {
    pub fn new(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// An empty underlying value marks a "please choose" placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.value.as_deref(), Some(v) if v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Element id for scalar fields and dropdowns, synthetic group key for radio groups.
    pub identifier: String,
    pub kind: FieldKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

impl Field {
    pub fn scalar(identifier: impl Into<String>, kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            label: label.into(),
            options: Vec::new(),
        }
    }

    pub fn choice(
        identifier: impl Into<String>,
        kind: FieldKind,
        label: impl Into<String>,
        options: Vec<FieldOption>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            label: label.into(),
            options,
        }
    }

    /// Visible labels of dropdown options that can actually be chosen.
    pub fn valid_option_labels(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|o| !o.is_placeholder())
            .map(|o| o.label.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Identifiers an oracle may answer for this field.
    pub fn answerable_identifiers(&self) -> Vec<&str> {
        match self.kind {
            FieldKind::RadioGroup => self
                .options
                .iter()
                .map(|o| o.identifier.as_str())
                .filter(|id| !id.is_empty())
                .collect(),
            _ => vec![self.identifier.as_str()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_option_labels_skip_placeholder() {
        let field = Field::choice(
            "single-select-question-1",
            FieldKind::SingleSelect,
            "Country",
            vec![
                FieldOption::new("", "Select an option").with_value(""),
                FieldOption::new("", "United Kingdom").with_value("uk"),
                FieldOption::new("", "  ").with_value("blank"),
                FieldOption::new("", "Ireland").with_value("ie"),
            ],
        );

        assert_eq!(field.valid_option_labels(), vec!["United Kingdom", "Ireland"]);
    }

    #[test]
    fn test_radio_group_answerable_identifiers_are_options() {
        let field = Field::choice(
            "radio-group:q1",
            FieldKind::RadioGroup,
            "Authorized to work?",
            vec![
                FieldOption::new("single-select-question-:r1:-0", "Yes"),
                FieldOption::new("single-select-question-:r1:-1", "No"),
            ],
        );

        assert_eq!(
            field.answerable_identifiers(),
            vec!["single-select-question-:r1:-0", "single-select-question-:r1:-1"]
        );
        assert!(FieldKind::RadioGroup.is_choice());
        assert!(!FieldKind::Textarea.is_choice());
    }
}

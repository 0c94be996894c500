// src/form/normalizer.rs
//! Turns line-oriented oracle output into `identifier:value` pairs.
//!
//! Rules, applied per non-blank line after stripping fences and backticks:
//! - a bare radio-option identifier, or any line without a colon, means "selected";
//! - `id::value` is the same as `id:value`;
//! - otherwise the line splits on its first colon, the rest is the value.
//!
//! Radio option identifiers may contain one colon-wrapped segment right after the prefix
//! (`single-select-question-:r1:-0`). Anything after that identifier is the value, so
//! `single-select-question-q3:5-10` stays a dropdown answer with value `5-10`.

use regex::Regex;
use std::fmt;

use crate::app_log;
use crate::types::{Answer, AnswerValue};

pub const SELECTED: &str = "selected";

const LANGUAGE_TAGS: &[&str] = &[
    "plaintext", "text", "txt", "json", "yaml", "yml", "csv", "markdown", "md",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAnswer {
    pub identifier: String,
    pub value: String,
}

impl fmt::Display for NormalizedAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.identifier, self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub answers: Vec<NormalizedAnswer>,
    /// Lines that had no usable identifier.
    pub dropped: usize,
}

impl Normalized {
    pub fn into_answers(self) -> Vec<Answer> {
        self.answers
            .into_iter()
            .map(|a| Answer {
                identifier: a.identifier,
                value: AnswerValue::Text(a.value),
            })
            .collect()
    }

    pub fn to_lines(&self) -> String {
        self.answers
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct AnswerNormalizer {
    radio_bare: Regex,
    radio_valued: Regex,
}

impl Default for AnswerNormalizer {
    fn default() -> Self {
        // The default prefix is a literal, the patterns always compile.
        Self::new("single-select-question-").expect("default radio pattern is valid")
    }
}

impl AnswerNormalizer {
    pub fn new(radio_prefix: &str) -> Result<Self, regex::Error> {
        let shape = format!(r"{}(?::\w+:)?[\w-]*-\d+", regex::escape(radio_prefix));
        Ok(Self {
            radio_bare: Regex::new(&format!(r"^{}$", shape))?,
            radio_valued: Regex::new(&format!(r"^({})::?(.*)$", shape))?,
        })
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        let mut normalized = Normalized::default();
        let mut seen_content = false;

        for raw_line in raw.lines() {
            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with("```") {
                continue;
            }

            let line = trimmed.trim_matches('`').trim();
            if line.is_empty() {
                continue;
            }
            if !seen_content && is_language_tag(line) {
                seen_content = true;
                continue;
            }
            seen_content = true;

            let (identifier, value) = self.split_line(line);
            if identifier.is_empty() {
                normalized.dropped += 1;
                continue;
            }
            normalized.answers.push(NormalizedAnswer {
                identifier: identifier.to_string(),
                value: value.to_string(),
            });
        }

        if normalized.dropped > 0 {
            app_log!(
                debug,
                "Normalizer dropped {} line(s) without an identifier",
                normalized.dropped
            );
        }
        normalized
    }

    fn split_line<'a>(&self, line: &'a str) -> (&'a str, &'a str) {
        if self.radio_bare.is_match(line) {
            return (line, SELECTED);
        }

        if let Some(caps) = self.radio_valued.captures(line) {
            if let (Some(id), Some(value)) = (caps.get(1), caps.get(2)) {
                let value = value.as_str().trim();
                return (id.as_str(), if value.is_empty() { SELECTED } else { value });
            }
        }

        match line.find(':') {
            Some(pos) => {
                let identifier = line[..pos].trim();
                let rest = &line[pos + 1..];
                let value = rest.strip_prefix(':').unwrap_or(rest);
                (identifier, value.trim())
            }
            None => (line, SELECTED),
        }
    }
}

fn is_language_tag(line: &str) -> bool {
    let lower = line.to_lowercase();
    LANGUAGE_TAGS.contains(&lower.as_str())
}

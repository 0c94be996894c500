// src/types/answer.rs
//! Answers at the oracle boundary and the audit log built from them

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Raw answer value as returned by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    /// Literal form typed into text controls and matched against dropdown labels.
    pub fn as_input_text(&self) -> String {
        match self {
            AnswerValue::Bool(b) => b.to_string(),
            AnswerValue::Number(n) => n.to_string(),
            AnswerValue::Text(s) => s.clone(),
        }
    }

    /// Human-facing form used in the question/answer log.
    pub fn as_audit_text(&self) -> String {
        match self {
            AnswerValue::Bool(true) => "Yes".to_string(),
            AnswerValue::Bool(false) => "No".to_string(),
            other => other.as_input_text(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "id")]
    pub identifier: String,
    pub value: AnswerValue,
}

impl Answer {
    pub fn new(identifier: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self {
            identifier: identifier.into(),
            value: value.into(),
        }
    }
}

/// Identifier-keyed answers for one detection round. Keeps oracle order; a repeated
/// identifier replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSet {
    answers: Vec<Answer>,
    index: HashMap<String, usize>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, answer: Answer) {
        match self.index.get(&answer.identifier) {
            Some(&pos) => self.answers[pos] = answer,
            None => {
                self.index
                    .insert(answer.identifier.clone(), self.answers.len());
                self.answers.push(answer);
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&AnswerValue> {
        self.index
            .get(identifier)
            .map(|&pos| &self.answers[pos].value)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<Answer> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = Answer>>(iter: I) -> Self {
        let mut set = AnswerSet::new();
        for answer in iter {
            set.insert(answer);
        }
        set
    }
}

/// Question label → rendered answer, accumulated over a whole wizard run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionAnswerLog {
    entries: Vec<(String, String)>,
}

impl QuestionAnswerLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels are not globally unique, so a later page overwrites an earlier entry.
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into();
        let answer = answer.into();
        match self.entries.iter_mut().find(|(q, _)| *q == question) {
            Some(entry) => entry.1 = answer,
            None => self.entries.push((question, answer)),
        }
    }

    pub fn merge(&mut self, other: QuestionAnswerLog) {
        for (question, answer) in other.entries {
            self.record(question, answer);
        }
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, a)| a.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for QuestionAnswerLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (question, answer) in &self.entries {
            map.serialize_entry(question, answer)?;
        }
        map.end()
    }
}

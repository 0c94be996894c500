// src/types/mod.rs
pub mod answer;
pub mod field;
pub mod outcome;

pub use answer::{Answer, AnswerSet, AnswerValue, QuestionAnswerLog};
pub use field::{Field, FieldKind, FieldOption};
pub use outcome::{ApplicationStatus, WizardOutcome};

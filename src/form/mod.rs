// src/form/mod.rs
//! Question-page pipeline: detect fields, resolve answers, apply them.

pub mod answer_resolver;
pub mod autofill;
pub mod field_detector;
pub mod normalizer;

pub use answer_resolver::{AnswerResolver, Resolution, ResolutionStatus};
pub use autofill::{AutofillExecutor, AutofillReport};
pub use field_detector::FieldDetector;
pub use normalizer::AnswerNormalizer;

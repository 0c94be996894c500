// src/lib.rs
//! Application wizard autopilot: detects form fields on a multi-step job application,
//! resolves answers through an oracle and drives the wizard to submission or review.

pub mod browser;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod form;
pub mod oracle;
pub mod types;
pub mod utils;
pub mod wizard;

pub use config::AppConfig;
pub use types::{ApplicationStatus, Field, FieldKind, QuestionAnswerLog, WizardOutcome};
pub use wizard::WizardController;

/// Crate logging entry point, forwards to `tracing` at the given level.
///
/// ```ignore
/// app_log!(info, "Filled field {}", id);
/// ```
#[macro_export]
macro_rules! app_log {
    (trace, $($arg:tt)+) => { ::tracing::trace!($($arg)+) };
    (debug, $($arg:tt)+) => { ::tracing::debug!($($arg)+) };
    (info, $($arg:tt)+) => { ::tracing::info!($($arg)+) };
    (warn, $($arg:tt)+) => { ::tracing::warn!($($arg)+) };
    (error, $($arg:tt)+) => { ::tracing::error!($($arg)+) };
}

// src/form/autofill.rs
use strsim::normalized_levenshtein;

use crate::app_log;
use crate::browser::{Locator, Pacer, PageDriver};
use crate::error::DriverError;
use crate::types::{AnswerSet, Field, FieldKind};

/// Similarity a fuzzy dropdown match must reach before falling back to the best overall.
pub const SIMILARITY_FLOOR: f64 = 0.6;

/// Field identifiers by outcome, in field order. Fields without an answer are not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutofillReport {
    pub filled: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl AutofillReport {
    pub fn wrote_anything(&self) -> bool {
        !self.filled.is_empty()
    }
}

enum Outcome {
    Filled,
    Skipped,
}

/// Applies one round of answers to the live page. Never fails as a whole.
pub struct AutofillExecutor<'a> {
    driver: &'a dyn PageDriver,
    pacer: &'a Pacer,
}

impl<'a> AutofillExecutor<'a> {
    pub fn new(driver: &'a dyn PageDriver, pacer: &'a Pacer) -> Self {
        Self { driver, pacer }
    }

    pub async fn apply(&self, fields: &[Field], answers: &AnswerSet) -> AutofillReport {
        let mut report = AutofillReport::default();

        for field in fields {
            let result = match field.kind {
                FieldKind::Text | FieldKind::Textarea => match answers.get(&field.identifier) {
                    Some(value) => self.fill_text(field, &value.as_input_text()).await,
                    None => continue,
                },
                FieldKind::SingleSelect => match answers.get(&field.identifier) {
                    Some(value) => self.fill_select(field, &value.as_input_text()).await,
                    None => continue,
                },
                FieldKind::RadioGroup => {
                    // Presence of an option id is the answer, its value is ignored.
                    match field.options.iter().find(|o| answers.contains(&o.identifier)) {
                        Some(option) => self.fill_radio(field, &option.identifier).await,
                        None => {
                            app_log!(debug, "No answered option for group {}", field.label);
                            continue;
                        }
                    }
                }
            };

            match result {
                Ok(Outcome::Filled) => report.filled.push(field.identifier.clone()),
                Ok(Outcome::Skipped) => {
                    app_log!(debug, "Skipping already filled field {}", field.identifier);
                    report.skipped.push(field.identifier.clone())
                }
                Err(e) => {
                    app_log!(warn, "Could not fill {} ({}): {}", field.identifier, field.label, e);
                    report.failed.push(field.identifier.clone());
                }
            }
        }

        app_log!(
            info,
            "Autofill: {} filled, {} skipped, {} failed",
            report.filled.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }

    async fn fill_text(&self, field: &Field, text: &str) -> Result<Outcome, DriverError> {
        let locator = Locator::id(&field.identifier);
        if !self.driver.value(&locator).await?.trim().is_empty() {
            return Ok(Outcome::Skipped);
        }

        self.bring_into_view(&locator).await?;
        self.driver.focus(&locator).await?;
        for ch in text.chars() {
            if let Err(e) = self.driver.type_char(&locator, ch).await {
                app_log!(debug, "Typing into {} interrupted: {}", field.identifier, e);
                break;
            }
            self.pacer.keystroke().await;
        }
        // Controlled inputs may drop synthetic keystrokes; the forced value is authoritative.
        self.driver.set_value(&locator, text).await?;
        self.pacer.after_write().await;

        app_log!(info, "Filled {} with {:?}", field.label, text);
        Ok(Outcome::Filled)
    }

    async fn fill_select(&self, field: &Field, wanted: &str) -> Result<Outcome, DriverError> {
        let locator = Locator::id(&field.identifier);
        if let Some(current) = self.driver.selected_value(&locator).await? {
            if !current.trim().is_empty() {
                return Ok(Outcome::Skipped);
            }
        }

        let labels = field.valid_option_labels();
        let choice = pick_best_label(&labels, wanted)
            .ok_or_else(|| DriverError::NotFound(format!("options of {}", field.identifier)))?;

        self.bring_into_view(&locator).await?;
        self.driver.select_by_label(&locator, &choice).await?;
        self.pacer.after_write().await;

        app_log!(info, "Selected {:?} for {}", choice, field.label);
        Ok(Outcome::Filled)
    }

    async fn fill_radio(&self, field: &Field, option_id: &str) -> Result<Outcome, DriverError> {
        for option in &field.options {
            if self.driver.is_checked(&Locator::id(&option.identifier)).await? {
                return Ok(Outcome::Skipped);
            }
        }

        let locator = Locator::id(option_id);
        self.bring_into_view(&locator).await?;
        self.driver.check(&locator).await?;
        self.pacer.after_write().await;

        app_log!(info, "Selected radio {} for {}", option_id, field.label);
        Ok(Outcome::Filled)
    }

    async fn bring_into_view(&self, locator: &Locator) -> Result<(), DriverError> {
        self.driver.scroll_into_view(locator).await?;
        self.pacer.scroll().await;
        Ok(())
    }
}

/// Case-insensitive exact label, else the closest label by normalized Levenshtein
/// similarity. Only an empty label list yields `None`.
pub fn pick_best_label(labels: &[String], wanted: &str) -> Option<String> {
    let wanted = wanted.trim().to_lowercase();

    if let Some(exact) = labels.iter().find(|l| l.trim().to_lowercase() == wanted) {
        return Some(exact.clone());
    }

    let mut best: Option<(&String, f64)> = None;
    for label in labels {
        let score = normalized_levenshtein(&wanted, &label.trim().to_lowercase());
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((label, score));
        }
    }

    let (label, score) = best?;
    if score < SIMILARITY_FLOOR {
        app_log!(
            warn,
            "No option close to {:?}, using best available {:?} ({:.2})",
            wanted,
            label,
            score
        );
    }
    Some(label.clone())
}

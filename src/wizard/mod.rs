// src/wizard/mod.rs
//! Address-driven state machine that walks the application wizard to a terminal status.

pub mod state;
mod steps;

use std::path::PathBuf;
use std::sync::Arc;

use crate::app_log;
use crate::browser::{Pacer, PageDriver};
use crate::config::{AppConfig, SiteSelectors, TimeoutConfig};
use crate::core::SnapshotStore;
use crate::form::{AnswerResolver, FieldDetector};
use crate::oracle::Oracle;
use crate::types::{ApplicationStatus, WizardOutcome};

pub use state::{PageClassifier, UrlClassifier, WizardRun, WizardState};

pub struct WizardController<'a> {
    driver: &'a dyn PageDriver,
    detector: FieldDetector,
    resolver: AnswerResolver,
    classifier: Box<dyn PageClassifier>,
    pacer: Pacer,
    snapshots: SnapshotStore,
    selectors: SiteSelectors,
    timeouts: TimeoutConfig,
    resume_path: PathBuf,
    final_submit: bool,
    max_stagnation: u32,
    max_iterations: usize,
    profile: String,
}

impl<'a> WizardController<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        oracle: Arc<dyn Oracle>,
        config: &AppConfig,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            detector: FieldDetector::new(config.selectors.clone()),
            resolver: AnswerResolver::new(oracle),
            classifier: Box::new(UrlClassifier),
            pacer: Pacer::new(config.pacing.clone()),
            snapshots: SnapshotStore::new(&config.snapshot),
            selectors: config.selectors.clone(),
            timeouts: config.timeouts.clone(),
            resume_path: config.resume_path.clone(),
            final_submit: config.final_submit,
            max_stagnation: config.max_stagnation,
            max_iterations: config.max_iterations,
            profile: profile.into(),
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn PageClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Drive the wizard until review, submission or failure. Never errors: the caller
    /// always gets a status and whatever answers were logged on the way.
    pub async fn run(&self) -> WizardOutcome {
        let mut run = WizardRun::new(self.max_stagnation);

        loop {
            if run.is_stagnant() {
                app_log!(
                    warn,
                    "No progress after {} attempts, marking application failed",
                    run.stagnation_count()
                );
                return self.finish(run, ApplicationStatus::Failed, None);
            }
            if run.iterations() >= self.max_iterations {
                app_log!(
                    warn,
                    "Gave up after {} wizard steps without reaching review",
                    run.iterations()
                );
                return self.finish(run, ApplicationStatus::Failed, None);
            }

            let step = run.tick();
            let url = match self.driver.url().await {
                Ok(url) => url,
                Err(e) => {
                    app_log!(warn, "Could not read the current address: {}", e);
                    run.stalled();
                    continue;
                }
            };

            let state = self.classifier.classify(&url);
            app_log!(info, "[{}] step {} at {}", state, step, url);

            match state {
                WizardState::Review => return self.handle_review(run, &url).await,
                WizardState::Resume if run.mark_resume_attempted(&url) => {
                    self.handle_resume(&mut run, &url).await
                }
                WizardState::Questions if !run.is_processed(&url) => {
                    self.handle_questions(&mut run, &url).await
                }
                WizardState::Documents if !run.is_processed(&url) => {
                    self.handle_documents(&mut run, &url).await
                }
                _ => self.handle_other(&mut run, &url).await,
            }
        }
    }

    fn finish(
        &self,
        run: WizardRun,
        status: ApplicationStatus,
        snapshot: Option<PathBuf>,
    ) -> WizardOutcome {
        let iterations = run.iterations();
        app_log!(
            info,
            "Wizard finished: {} after {} step(s), {} answer(s) logged",
            status,
            iterations,
            run.log().len()
        );
        WizardOutcome::new(status, run.into_log(), iterations).with_snapshot(snapshot)
    }
}

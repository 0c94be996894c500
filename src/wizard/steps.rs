// src/wizard/steps.rs
//! Per-state handlers of the wizard. Every sub-step tolerates missing UI.

use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::state::WizardRun;
use super::WizardController;
use crate::app_log;
use crate::browser::{wait_and_click, wait_for_element, Locator};
use crate::error::DriverError;
use crate::form::{AutofillExecutor, AutofillReport};
use crate::types::{ApplicationStatus, WizardOutcome};
use crate::utils::contains_ignore_case;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

impl<'a> WizardController<'a> {
    pub(super) async fn handle_resume(&self, run: &mut WizardRun, url: &str) {
        if contains_ignore_case(url, &self.selectors.privacy_step_marker) {
            self.opt_out_of_privacy().await;
        } else {
            self.replace_resume().await;
        }
        self.advance_and_track(run, url).await;
    }

    pub(super) async fn handle_questions(&self, run: &mut WizardRun, url: &str) {
        run.mark_processed(url);

        self.fill_round(run).await;
        if self.advance(url).await {
            run.progressed();
            return;
        }

        if run.take_retry(url) {
            app_log!(info, "Still on {} after filling, retrying once", url);
            self.fill_round(run).await;
            if self.advance(url).await {
                run.progressed();
                return;
            }
        }
        run.stalled();
    }

    pub(super) async fn handle_documents(&self, run: &mut WizardRun, url: &str) {
        run.mark_processed(url);

        if !contains_ignore_case(url, &self.selectors.documents_marker) {
            self.advance_and_track(run, url).await;
            return;
        }

        let review = Locator::button(&self.selectors.review_button_label);
        let clicked = wait_and_click(
            self.driver,
            &review,
            secs(self.timeouts.element_secs),
            self.timeouts.poll_interval(),
        )
        .await;

        match clicked {
            Ok(()) => {
                if self.wait_for_address_change(url).await {
                    self.pacer.after_advance().await;
                    run.progressed();
                } else {
                    app_log!(warn, "Review button did not leave {}", url);
                    run.stalled();
                }
            }
            Err(e) => {
                app_log!(info, "No review button on documents step: {}", e);
                run.stalled();
            }
        }
    }

    pub(super) async fn handle_other(&self, run: &mut WizardRun, url: &str) {
        self.advance_and_track(run, url).await;
    }

    /// Terminal. Always snapshots; submits only when enabled and a submit control exists.
    pub(super) async fn handle_review(&self, run: WizardRun, url: &str) -> WizardOutcome {
        let snapshot = self.capture_snapshot().await;

        if !self.final_submit {
            app_log!(info, "Final submission disabled, leaving application at review");
            return self.finish(run, ApplicationStatus::Review, snapshot);
        }

        let submit = Locator::button(&self.selectors.submit_button_label);
        if !self.driver.exists(&submit).await {
            app_log!(warn, "No submit control on review page");
            return self.finish(run, ApplicationStatus::Review, snapshot);
        }

        if let Err(e) = self.click(&submit).await {
            app_log!(warn, "Submit click failed: {}", e);
            return self.finish(run, ApplicationStatus::Review, snapshot);
        }
        self.pacer.after_submit().await;

        // The address change is the only proof the submission went through.
        if self.wait_for_address_change(url).await {
            app_log!(info, "Application submitted");
            self.finish(run, ApplicationStatus::Success, snapshot)
        } else {
            app_log!(warn, "Submit clicked but the page did not change");
            self.finish(run, ApplicationStatus::Review, snapshot)
        }
    }

    async fn fill_round(&self, run: &mut WizardRun) -> AutofillReport {
        self.pacer.before_detect().await;

        let html = match self.driver.content().await {
            Ok(html) => html,
            Err(e) => {
                app_log!(warn, "Could not read page content: {}", e);
                return AutofillReport::default();
            }
        };

        let fields = self.detector.detect(&html);
        if fields.is_empty() {
            app_log!(info, "No fillable fields detected");
            return AutofillReport::default();
        }

        let resolution = self.resolver.resolve(&self.profile, &fields).await;
        if !resolution.is_answered() {
            app_log!(info, "No answers this round, skipping autofill");
            return AutofillReport::default();
        }
        run.record_answers(resolution.audit);

        AutofillExecutor::new(self.driver, &self.pacer)
            .apply(&fields, &resolution.answers)
            .await
    }

    async fn opt_out_of_privacy(&self) {
        let optout = Locator::css(&self.selectors.privacy_optout);
        match wait_and_click(
            self.driver,
            &optout,
            secs(self.timeouts.privacy_modal_secs),
            self.timeouts.poll_interval(),
        )
        .await
        {
            Ok(()) => app_log!(info, "Opted out of privacy sharing"),
            Err(e) => app_log!(info, "No privacy opt-out choice: {}", e),
        }
        self.pacer.menu_step().await;
    }

    async fn replace_resume(&self) {
        let poll = self.timeouts.poll_interval();
        let menu = Locator::css(&self.selectors.resume_options_menu);

        if wait_for_element(self.driver, &menu, secs(self.timeouts.resume_probe_secs), poll)
            .await
            .is_err()
        {
            app_log!(info, "No resume options on this page, keeping the current resume");
            return;
        }
        if !self.resume_path.exists() {
            app_log!(warn, "Resume file {} not found, skipping upload", self.resume_path.display());
            return;
        }

        if let Err(e) = self.click(&menu).await {
            app_log!(warn, "Could not open resume options: {}", e);
            return;
        }
        self.pacer.menu_step().await;

        let upload = Locator::css(&self.selectors.resume_upload_button);
        if let Err(e) = wait_and_click(self.driver, &upload, secs(self.timeouts.resume_menu_secs), poll).await {
            app_log!(warn, "No upload option in resume menu: {}", e);
            if let Err(e) = self.driver.press_escape().await {
                app_log!(debug, "Escape failed: {}", e);
            }
            return;
        }
        self.pacer.menu_step().await;

        let input = Locator::css(&self.selectors.file_input);
        let uploaded = match wait_for_element(self.driver, &input, secs(self.timeouts.element_secs), poll).await {
            Ok(()) => self.driver.upload_file(&input, &self.resume_path).await,
            Err(e) => Err(e),
        };
        match &uploaded {
            Ok(()) => app_log!(info, "Uploaded resume {}", self.resume_path.display()),
            Err(e) => app_log!(warn, "Resume upload failed: {}", e),
        }

        // The native file dialog and the menu both swallow one escape.
        for _ in 0..2 {
            if let Err(e) = self.driver.press_escape().await {
                app_log!(debug, "Escape failed: {}", e);
            }
            self.pacer.menu_step().await;
        }

        // Visibility only applies to a freshly uploaded file.
        if uploaded.is_ok() {
            self.mark_resume_private().await;
        }
    }

    async fn mark_resume_private(&self) {
        let poll = self.timeouts.poll_interval();
        let private = Locator::css(&self.selectors.resume_private_label);

        if let Err(e) = wait_and_click(self.driver, &private, secs(self.timeouts.privacy_modal_secs), poll).await {
            app_log!(info, "No resume visibility choice: {}", e);
            return;
        }
        self.pacer.menu_step().await;

        let save = Locator::css(&self.selectors.resume_privacy_save);
        match wait_and_click(self.driver, &save, secs(self.timeouts.privacy_save_secs), poll).await {
            Ok(()) => app_log!(info, "Resume marked private"),
            Err(e) => app_log!(warn, "Could not save resume visibility: {}", e),
        }
    }

    async fn capture_snapshot(&self) -> Option<std::path::PathBuf> {
        let html = match self.driver.content().await {
            Ok(html) => html,
            Err(e) => {
                app_log!(warn, "Could not read review page: {}", e);
                return None;
            }
        };
        match self.snapshots.persist(&html).await {
            Ok(path) => Some(path),
            Err(e) => {
                app_log!(error, "Failed to save review snapshot: {:#}", e);
                None
            }
        }
    }

    async fn advance_and_track(&self, run: &mut WizardRun, url: &str) {
        if self.advance(url).await {
            run.progressed();
        } else {
            run.stalled();
        }
    }

    /// Click the first continue-style control present, in preference order, and report
    /// whether the address moved.
    async fn advance(&self, from_url: &str) -> bool {
        for label in &self.selectors.continue_labels {
            let locator = Locator::button(label);
            if !self.driver.exists(&locator).await {
                continue;
            }
            if let Err(e) = self.click(&locator).await {
                app_log!(warn, "Clicking {:?} failed: {}", label, e);
                continue;
            }

            app_log!(info, "Clicked {:?}", label);
            let moved = self.wait_for_address_change(from_url).await;
            if moved {
                self.pacer.after_advance().await;
            }
            return moved;
        }

        app_log!(info, "No continue control on {}", from_url);
        false
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        self.driver.scroll_into_view(locator).await?;
        self.pacer.scroll().await;
        self.driver.click(locator).await
    }

    async fn wait_for_address_change(&self, from_url: &str) -> bool {
        let deadline = Instant::now() + secs(self.timeouts.advance_secs);
        loop {
            if let Ok(url) = self.driver.url().await {
                if url != from_url {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.timeouts.poll_interval()).await;
        }
    }
}

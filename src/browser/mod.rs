// src/browser/mod.rs
//! The live-page seam. The wizard, executor and detector only ever talk to a `PageDriver`.

pub mod chromium;
pub mod pacing;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::DriverError;

pub use chromium::{BrowserSession, ChromiumPage};
pub use pacing::Pacer;

/// How an element is addressed on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Element id, may contain characters that are special in CSS (`:r1:`).
    Id(String),
    Css(String),
    /// A button or link whose visible text equals the label, ignoring case and spacing.
    Button(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn button(label: impl Into<String>) -> Self {
        Locator::Button(label.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Css(selector) => write!(f, "{}", selector),
            Locator::Button(label) => write!(f, "button \"{}\"", label),
        }
    }
}

/// Operations the wizard needs from one open page. Every call acts on the first element
/// the locator matches.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn url(&self) -> Result<String, DriverError>;

    /// Serialized DOM of the current document.
    async fn content(&self) -> Result<String, DriverError>;

    async fn count(&self, locator: &Locator) -> Result<usize, DriverError>;

    async fn click(&self, locator: &Locator) -> Result<(), DriverError>;

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), DriverError>;

    async fn focus(&self, locator: &Locator) -> Result<(), DriverError>;

    /// Type one character into the focused control as a key press.
    async fn type_char(&self, locator: &Locator, ch: char) -> Result<(), DriverError>;

    /// Current value of an input or textarea.
    async fn value(&self, locator: &Locator) -> Result<String, DriverError>;

    /// Force the value and fire `input` and `change`.
    async fn set_value(&self, locator: &Locator, value: &str) -> Result<(), DriverError>;

    /// Underlying value of the chosen option of a dropdown, `None` when nothing is chosen.
    async fn selected_value(&self, locator: &Locator) -> Result<Option<String>, DriverError>;

    /// Choose a dropdown option by its visible label.
    async fn select_by_label(&self, locator: &Locator, label: &str) -> Result<(), DriverError>;

    async fn is_checked(&self, locator: &Locator) -> Result<bool, DriverError>;

    async fn check(&self, locator: &Locator) -> Result<(), DriverError>;

    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), DriverError>;

    async fn press_escape(&self) -> Result<(), DriverError>;

    async fn exists(&self, locator: &Locator) -> bool {
        matches!(self.count(locator).await, Ok(n) if n > 0)
    }
}

/// Poll until the locator matches something or the timeout elapses.
pub async fn wait_for_element(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    poll: Duration,
) -> Result<(), DriverError> {
    let deadline = Instant::now() + timeout;
    loop {
        if driver.exists(locator).await {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(DriverError::Timeout(locator.to_string()));
        }
        sleep(poll).await;
    }
}

/// Wait for a clickable element, then click it.
pub async fn wait_and_click(
    driver: &dyn PageDriver,
    locator: &Locator,
    timeout: Duration,
    poll: Duration,
) -> Result<(), DriverError> {
    wait_for_element(driver, locator, timeout, poll).await?;
    driver.scroll_into_view(locator).await?;
    driver.click(locator).await
}

#[cfg(test)]
mod tests {
    use super::scripted::{ScriptedPage, Screen};
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_element_times_out() {
        let page = ScriptedPage::new(vec![Screen::new("https://x/apply/other", "<p>empty</p>")]);
        let result = wait_for_element(
            &page,
            &Locator::css("#missing"),
            Duration::from_secs(2),
            Duration::from_millis(250),
        )
        .await;

        assert!(matches!(result, Err(DriverError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_element_finds_present_element() {
        let page = ScriptedPage::new(vec![Screen::new(
            "https://x/apply/other",
            r#"<button id="go">Continue</button>"#,
        )]);

        assert!(wait_for_element(
            &page,
            &Locator::button("continue"),
            Duration::from_secs(1),
            Duration::from_millis(250),
        )
        .await
        .is_ok());
        assert!(page.exists(&Locator::id("go")).await);
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(Locator::id("a:b").to_string(), "#a:b");
        assert_eq!(Locator::button("Continue").to_string(), "button \"Continue\"");
    }
}

// src/browser/chromium.rs
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use super::{Locator, PageDriver};
use crate::app_log;
use crate::config::{BrowserConfig, TimeoutConfig};
use crate::error::DriverError;

/// A launched Chrome plus the task pumping its DevTools connection.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .user_data_dir(&config.user_data_dir)
            .args(config.args.clone());
        if !config.headless {
            builder = builder.with_head();
        }
        let chrome_config = builder
            .build()
            .map_err(|e| anyhow!("Invalid browser configuration: {}", e))?;

        let (browser, mut handler) = Browser::launch(chrome_config)
            .await
            .context("Failed to launch Chrome")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    app_log!(warn, "Browser handler error: {}", e);
                }
            }
        });

        app_log!(
            info,
            "Browser launched (profile {})",
            config.user_data_dir.display()
        );
        Ok(Self { browser, handler })
    }

    pub async fn open(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;
        page.wait_for_navigation()
            .await
            .with_context(|| format!("Navigation to {} did not finish", url))?;
        Ok(page)
    }

    /// Click the apply button on the job page and wait for the application to open in a new
    /// tab. Failing to see the tab is fatal for this job.
    pub async fn open_application(
        &self,
        job_page: &Page,
        apply_button: &str,
        timeouts: &TimeoutConfig,
    ) -> Result<ChromiumPage> {
        let before: HashSet<String> = self
            .browser
            .pages()
            .await
            .context("Failed to list tabs")?
            .iter()
            .map(|p| p.target_id().as_ref().to_string())
            .collect();

        job_page
            .find_element(apply_button)
            .await
            .with_context(|| format!("Apply button {} not found", apply_button))?
            .click()
            .await
            .context("Failed to click the apply button")?;

        let deadline = Instant::now() + std::time::Duration::from_secs(timeouts.new_tab_secs);
        loop {
            let pages = self.browser.pages().await.context("Failed to list tabs")?;
            if let Some(page) = pages
                .into_iter()
                .find(|p| !before.contains(p.target_id().as_ref()))
            {
                page.bring_to_front()
                    .await
                    .context("Failed to focus the application tab")?;
                if let Err(e) = page.wait_for_navigation().await {
                    app_log!(warn, "Application tab still loading: {}", e);
                }
                app_log!(info, "Application tab opened");
                return Ok(ChromiumPage::new(page));
            }

            if Instant::now() >= deadline {
                bail!(
                    "Application tab did not open within {}s",
                    timeouts.new_tab_secs
                );
            }
            sleep(timeouts.poll_interval()).await;
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close the browser")?;
        self.handler.abort();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Probe {
    found: bool,
    #[serde(default)]
    value: Value,
}

/// `PageDriver` over a chromiumoxide tab. Element work is done in page scripts so that
/// every locator kind resolves the same way.
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Run `body` with `el` bound to the first match. `body` returns the value.
    async fn on_first<T: DeserializeOwned>(&self, locator: &Locator, body: &str) -> Result<T, DriverError> {
        let script = format!(
            "(() => {{ const el = ({})[0]; if (!el) return {{ found: false }}; \
             return {{ found: true, value: (() => {{ {} }})() ?? null }}; }})()",
            elements_js(locator),
            body
        );

        let probe: Probe = self
            .page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| DriverError::Script(e.to_string()))?;

        if !probe.found {
            return Err(DriverError::NotFound(locator.to_string()));
        }
        serde_json::from_value(probe.value).map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn element(&self, locator: &Locator) -> Result<Element, DriverError> {
        let css = match locator {
            Locator::Id(id) => format!("[id=\"{}\"]", css_escape(id)),
            Locator::Css(css) => css.clone(),
            Locator::Button(_) => {
                return Err(DriverError::Script(format!(
                    "{} cannot be resolved to an element handle",
                    locator
                )))
            }
        };
        self.page
            .find_element(css)
            .await
            .map_err(|_| DriverError::NotFound(locator.to_string()))
    }
}

fn js_string(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn css_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Script expression evaluating to an array of matching elements.
fn elements_js(locator: &Locator) -> String {
    match locator {
        Locator::Id(id) => format!("[document.getElementById({})].filter(Boolean)", js_string(id)),
        Locator::Css(css) => format!("Array.from(document.querySelectorAll({}))", js_string(css)),
        Locator::Button(label) => format!(
            "Array.from(document.querySelectorAll('button, a, [role=\"button\"]')).filter(e => \
             (e.innerText || e.textContent || '').replace(/\\s+/g, ' ').trim().toLowerCase() === {}.toLowerCase())",
            js_string(label.trim())
        ),
    }
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn url(&self) -> Result<String, DriverError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn content(&self) -> Result<String, DriverError> {
        Ok(self.page.content().await?)
    }

    async fn count(&self, locator: &Locator) -> Result<usize, DriverError> {
        let count: usize = self
            .page
            .evaluate(format!("({}).length", elements_js(locator)))
            .await?
            .into_value()
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(count)
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        self.on_first(locator, "el.click(); return null;").await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), DriverError> {
        self.on_first(
            locator,
            "el.scrollIntoView({ block: 'center', behavior: 'smooth' }); return null;",
        )
        .await
    }

    async fn focus(&self, locator: &Locator) -> Result<(), DriverError> {
        self.on_first(locator, "el.focus(); return null;").await
    }

    async fn type_char(&self, locator: &Locator, ch: char) -> Result<(), DriverError> {
        self.element(locator).await?.type_str(ch.to_string()).await?;
        Ok(())
    }

    async fn value(&self, locator: &Locator) -> Result<String, DriverError> {
        self.on_first(locator, "return el.value ?? '';").await
    }

    async fn set_value(&self, locator: &Locator, value: &str) -> Result<(), DriverError> {
        let body = format!(
            "el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return null;",
            js_string(value)
        );
        self.on_first(locator, &body).await
    }

    async fn selected_value(&self, locator: &Locator) -> Result<Option<String>, DriverError> {
        self.on_first(
            locator,
            "const o = el.selectedIndex >= 0 ? el.options[el.selectedIndex] : null; \
             return o ? o.value : null;",
        )
        .await
    }

    async fn select_by_label(&self, locator: &Locator, label: &str) -> Result<(), DriverError> {
        let body = format!(
            "const wanted = {}; \
             const o = Array.from(el.options).find(o => (o.label || o.text || '').trim() === wanted); \
             if (!o) return false; \
             el.value = o.value; o.selected = true; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true;",
            js_string(label)
        );
        let chosen: bool = self.on_first(locator, &body).await?;
        if chosen {
            Ok(())
        } else {
            Err(DriverError::NotFound(format!("option \"{}\" in {}", label, locator)))
        }
    }

    async fn is_checked(&self, locator: &Locator) -> Result<bool, DriverError> {
        self.on_first(locator, "return !!el.checked;").await
    }

    async fn check(&self, locator: &Locator) -> Result<(), DriverError> {
        // Styled radios hide the input; clicking it still toggles and fires the handlers.
        self.on_first(
            locator,
            "if (!el.checked) { el.click(); } \
             if (!el.checked) { el.checked = true; el.dispatchEvent(new Event('change', { bubbles: true })); } \
             return null;",
        )
        .await
    }

    async fn upload_file(&self, locator: &Locator, path: &Path) -> Result<(), DriverError> {
        let element = self.element(locator).await?;
        let params = SetFileInputFilesParams::builder()
            .file(path.to_string_lossy().to_string())
            .backend_node_id(element.backend_node_id.clone())
            .build()
            .map_err(DriverError::Script)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn press_escape(&self) -> Result<(), DriverError> {
        let body = self
            .page
            .find_element("body")
            .await
            .map_err(|_| DriverError::NotFound("body".to_string()))?;
        body.press_key("Escape").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_js_quotes_identifiers() {
        let js = elements_js(&Locator::id("single-select-question-:r1:-0"));
        assert_eq!(
            js,
            "[document.getElementById(\"single-select-question-:r1:-0\")].filter(Boolean)"
        );

        let js = elements_js(&Locator::button("Review \"your\" application"));
        assert!(js.contains("\"Review \\\"your\\\" application\".toLowerCase()"));
    }

    #[test]
    fn test_css_escape() {
        assert_eq!(css_escape(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}

// src/config.rs
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

/// Everything the wizard and its adapters read from `config.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Candidate profile text handed to the oracle. Takes precedence over `profile_path`.
    pub profile: Option<String>,
    pub profile_path: Option<PathBuf>,
    pub resume_path: PathBuf,
    #[serde(deserialize_with = "deserialize_flag")]
    pub final_submit: bool,
    pub max_stagnation: u32,
    pub max_iterations: usize,
    pub snapshot: SnapshotConfig,
    pub oracle: OracleConfig,
    pub pacing: PacingConfig,
    pub selectors: SiteSelectors,
    pub timeouts: TimeoutConfig,
    pub browser: BrowserConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: None,
            profile_path: None,
            resume_path: PathBuf::from("Current - resume.docx"),
            final_submit: false,
            max_stagnation: 10,
            max_iterations: 200,
            snapshot: SnapshotConfig::default(),
            oracle: OracleConfig::default(),
            pacing: PacingConfig::default(),
            selectors: SiteSelectors::default(),
            timeouts: TimeoutConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Where the review page is written during a run, before it is archived.
    pub staging_path: PathBuf,
    pub submissions_dir: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            staging_path: PathBuf::from("review_snapshot.html"),
            submissions_dir: PathBuf::from("Submissions"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub api_url: String,
    pub model: String,
    /// Usually injected from `OPENAI_API_KEY` rather than written to the file.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
    /// Let the model invent a plausible answer when the profile does not cover a question.
    #[serde(deserialize_with = "deserialize_flag")]
    pub fabricate_missing: bool,
    /// Ask the model to never answer a yes/no screening question unfavorably.
    #[serde(deserialize_with = "deserialize_flag")]
    pub favorable_yes_no: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/responses".to_string(),
            model: "gpt-5-mini".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_output_tokens: 1200,
            fabricate_missing: true,
            favorable_yes_no: false,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    #[serde(deserialize_with = "deserialize_flag")]
    pub enabled: bool,
    pub keystroke: DelayRange,
    pub scroll: DelayRange,
    pub after_write: DelayRange,
    pub menu_step: DelayRange,
    pub after_advance: DelayRange,
    pub before_detect: DelayRange,
    pub after_submit: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keystroke: DelayRange::new(30, 80),
            scroll: DelayRange::new(200, 500),
            after_write: DelayRange::new(1000, 3000),
            menu_step: DelayRange::new(400, 900),
            after_advance: DelayRange::new(3000, 5000),
            before_detect: DelayRange::new(3000, 4000),
            after_submit: DelayRange::new(7000, 8000),
        }
    }
}

/// Structural signatures of the target site. Defaults match the site the wizard was built for.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub text_input_prefix: String,
    pub textarea_prefix: String,
    pub select_prefix: String,
    pub radio_prefix: String,
    pub question_container_class: String,
    pub continue_labels: Vec<String>,
    pub review_button_label: String,
    pub submit_button_label: String,
    pub documents_marker: String,
    pub privacy_step_marker: String,
    pub privacy_optout: String,
    pub resume_options_menu: String,
    pub resume_upload_button: String,
    pub file_input: String,
    pub resume_private_label: String,
    pub resume_privacy_save: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            text_input_prefix: "text-question-input-".to_string(),
            textarea_prefix: "rich-text-question-input-".to_string(),
            select_prefix: "single-select-question-".to_string(),
            radio_prefix: "single-select-question-".to_string(),
            question_container_class: "ia-Questions-item".to_string(),
            continue_labels: vec![
                "Continue".to_string(),
                "Continue applying".to_string(),
                "Review your application".to_string(),
            ],
            review_button_label: "Review your application".to_string(),
            submit_button_label: "Submit your application".to_string(),
            documents_marker: "documents".to_string(),
            privacy_step_marker: "privacy-settings".to_string(),
            privacy_optout: "label[data-testid='privacy-settings-optout-label']".to_string(),
            resume_options_menu: "button[data-testid='ResumeOptionsMenu']".to_string(),
            resume_upload_button: "button[data-testid='ResumeOptionsMenu-upload']".to_string(),
            file_input: "input[type='file']".to_string(),
            resume_private_label: "label[for$='-resume-private-input']".to_string(),
            resume_privacy_save: "button[data-testid='ResumePrivacyModal-SaveBtn']".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub element_secs: u64,
    pub resume_menu_secs: u64,
    pub resume_probe_secs: u64,
    pub privacy_modal_secs: u64,
    pub privacy_save_secs: u64,
    pub new_tab_secs: u64,
    /// How long a click has to change the address before it counts as no progress.
    pub advance_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            element_secs: 10,
            resume_menu_secs: 15,
            resume_probe_secs: 8,
            privacy_modal_secs: 5,
            privacy_save_secs: 8,
            new_tab_secs: 10,
            advance_secs: 5,
            poll_interval_ms: 250,
        }
    }
}

impl TimeoutConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub user_data_dir: PathBuf,
    #[serde(deserialize_with = "deserialize_flag")]
    pub headless: bool,
    /// Button on the job page that opens the application in a new tab.
    pub apply_button: String,
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_data_dir: PathBuf::from("chrome_profile"),
            headless: false,
            apply_button: "#indeedApplyButton".to_string(),
            args: vec!["--disable-blink-features=AutomationControlled".to_string()],
        }
    }
}

/// Parse a boolean-like setting: `true/false`, `yes/no`, `on/off`, `1/0`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" | "" => Some(false),
        _ => None,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
        Flag::Text(s) => parse_flag(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("not a boolean-like value: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag(" no "), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_yaml_partial_config_keeps_defaults() {
        let yaml = r#"
final_submit: "yes"
max_stagnation: 4
pacing:
  enabled: false
selectors:
  continue_labels: ["Next"]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.final_submit);
        assert_eq!(config.max_stagnation, 4);
        assert!(!config.pacing.enabled);
        assert_eq!(config.pacing.keystroke, DelayRange::new(30, 80));
        assert_eq!(config.selectors.continue_labels, vec!["Next"]);
        assert_eq!(config.selectors.submit_button_label, "Submit your application");
        assert_eq!(config.max_iterations, 200);
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("final_submit: sometimes");
        assert!(result.is_err());
    }
}

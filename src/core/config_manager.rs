// src/core/config_manager.rs
//! Loads `config.yaml`, applies environment overrides and resolves paths

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{parse_flag, AppConfig};
use crate::core::FsOps;

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub app: AppConfig,
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Load configuration from `AUTOAPPLY_CONFIG` (or `./config.yaml`) plus environment.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("AUTOAPPLY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut app = if config_path.exists() {
            info!("Loading configuration from {}", config_path.display());
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            warn!(
                "{} not found, running with built-in defaults",
                config_path.display()
            );
            AppConfig::default()
        };

        Self::apply_env_overrides(&mut app)?;
        Self::resolve_paths(&mut app)?;

        Ok(Self {
            app,
            config_path: config_path.to_path_buf(),
        })
    }

    pub fn parse(content: &str) -> Result<AppConfig> {
        let app: AppConfig = serde_yaml::from_str(content).context("Invalid configuration")?;
        if app.max_stagnation == 0 {
            anyhow::bail!("max_stagnation must be at least 1");
        }
        Ok(app)
    }

    fn apply_env_overrides(app: &mut AppConfig) -> Result<()> {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                app.oracle.api_key = Some(key);
            }
        }

        if let Ok(raw) = std::env::var("AUTOAPPLY_FINAL_SUBMIT") {
            app.final_submit = parse_flag(&raw).ok_or_else(|| {
                anyhow::anyhow!("AUTOAPPLY_FINAL_SUBMIT must be yes/no, got: {}", raw)
            })?;
        }

        if let Ok(raw) = std::env::var("AUTOAPPLY_MAX_STAGNATION") {
            app.max_stagnation = raw
                .parse::<u32>()
                .map_err(|_| anyhow::anyhow!("AUTOAPPLY_MAX_STAGNATION must be a number"))?
                .max(1);
        }

        Ok(())
    }

    fn resolve_paths(app: &mut AppConfig) -> Result<()> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        let resolve = |path: &PathBuf| -> PathBuf {
            if path.is_absolute() {
                path.clone()
            } else {
                current_dir.join(path)
            }
        };

        app.resume_path = resolve(&app.resume_path);
        app.snapshot.staging_path = resolve(&app.snapshot.staging_path);
        app.snapshot.submissions_dir = resolve(&app.snapshot.submissions_dir);
        app.browser.user_data_dir = resolve(&app.browser.user_data_dir);
        app.profile_path = app.profile_path.as_ref().map(resolve);
        Ok(())
    }

    /// Profile text for the oracle, inline or from `profile_path`.
    pub async fn load_profile(&self) -> Result<String> {
        if let Some(profile) = self.app.profile.as_ref().filter(|p| !p.trim().is_empty()) {
            return Ok(profile.clone());
        }

        let path = self
            .app
            .profile_path
            .as_ref()
            .context("Neither `profile` nor `profile_path` is configured")?;
        let profile = FsOps::read_file_safe(path).await?;
        if profile.trim().is_empty() {
            anyhow::bail!("Profile file is empty: {}", path.display());
        }
        Ok(profile)
    }

    /// Ensure snapshot directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        FsOps::ensure_dir_exists(&self.app.snapshot.submissions_dir).await?;
        if let Some(parent) = self.app.snapshot.staging_path.parent() {
            FsOps::ensure_dir_exists(parent).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_rejects_zero_stagnation() {
        assert!(ConfigManager::parse("max_stagnation: 0").is_err());
        assert!(ConfigManager::parse("max_stagnation: 3").is_ok());
    }

    #[tokio::test]
    async fn test_load_from_file_resolves_paths_and_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile_path = dir.path().join("profile.txt");
        std::fs::write(&profile_path, "Rust engineer, 6 years").unwrap();

        let config_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "profile_path: {}", profile_path.display()).unwrap();
        writeln!(file, "resume_path: resume.docx").unwrap();

        let manager = ConfigManager::load_from(&config_path).unwrap();

        assert!(manager.app.resume_path.is_absolute());
        assert!(manager.app.resume_path.ends_with("resume.docx"));
        assert_eq!(
            manager.load_profile().await.unwrap(),
            "Rust engineer, 6 years"
        );
    }

    #[tokio::test]
    async fn test_missing_profile_is_an_error() {
        let manager = ConfigManager {
            app: AppConfig::default(),
            config_path: PathBuf::from("config.yaml"),
        };
        assert!(manager.load_profile().await.is_err());
    }
}

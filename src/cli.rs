// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_log;
use crate::browser::BrowserSession;
use crate::config::AppConfig;
use crate::core::{ConfigManager, FsOps, SnapshotStore};
use crate::form::{AnswerNormalizer, FieldDetector};
use crate::oracle::{OpenAiOracle, Oracle};
use crate::types::WizardOutcome;
use crate::wizard::WizardController;

#[derive(Parser)]
#[command(name = "autoapply")]
#[command(about = "Fill in and submit multi-step job applications")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file, defaults to $AUTOAPPLY_CONFIG or ./config.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open a job page, start the application and drive the wizard to review or submission
    Apply {
        #[arg(long)]
        job_url: String,
        /// Used to name the archived review snapshot
        #[arg(long, default_value = "Untitled job")]
        job_title: String,
        #[arg(long)]
        job_id: Option<String>,
    },
    /// Print the form fields detected in a saved page as JSON
    Fields {
        #[arg(long)]
        html: PathBuf,
    },
    /// Normalize raw oracle output into id:value lines
    Normalize {
        #[arg(long)]
        input: PathBuf,
    },
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigManager::load_from(path)?,
        None => ConfigManager::load()?,
    };

    match cli.command {
        Command::Apply {
            job_url,
            job_title,
            job_id,
        } => {
            let job_id = job_id.unwrap_or_else(|| job_key(&job_url));
            let outcome = apply(&config, &job_url, &job_title, &job_id).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
            );
        }

        Command::Fields { html } => {
            let content = FsOps::read_file_safe(&html).await?;
            let fields = FieldDetector::new(config.app.selectors.clone()).detect(&content);
            println!(
                "{}",
                serde_json::to_string_pretty(&fields).context("Failed to serialize fields")?
            );
        }

        Command::Normalize { input } => {
            let raw = FsOps::read_file_safe(&input).await?;
            let normalizer = AnswerNormalizer::new(&config.app.selectors.radio_prefix)
                .context("Invalid radio identifier prefix")?;
            let normalized = normalizer.normalize(&raw);
            if normalized.dropped > 0 {
                app_log!(warn, "Dropped {} malformed line(s)", normalized.dropped);
            }
            println!("{}", normalized.to_lines());
        }
    }

    Ok(())
}

async fn apply(
    config: &ConfigManager,
    job_url: &str,
    job_title: &str,
    job_id: &str,
) -> Result<WizardOutcome> {
    config.ensure_directories().await?;
    let profile = config.load_profile().await?;

    let normalizer = AnswerNormalizer::new(&config.app.selectors.radio_prefix)
        .context("Invalid radio identifier prefix")?;
    let oracle: Arc<dyn Oracle> = Arc::new(
        OpenAiOracle::new(&config.app.oracle, normalizer).context("Failed to set up the oracle")?,
    );

    let session = BrowserSession::launch(&config.app.browser).await?;

    let mut outcome = match run_application(&session, &config.app, oracle, &profile, job_url).await {
        Ok(outcome) => outcome,
        Err(e) => {
            app_log!(error, "Could not start the application for {}: {:#}", job_url, e);
            WizardOutcome::failed_to_open()
        }
    };

    if outcome.snapshot.is_some() {
        let store = SnapshotStore::new(&config.app.snapshot);
        match store.archive(job_title, job_id).await {
            Ok(archived) => outcome.snapshot = archived,
            Err(e) => app_log!(error, "Failed to archive review snapshot: {:#}", e),
        }
    }

    app_log!(info, "Application for {} ended with {}", job_url, outcome.status);

    if let Err(e) = session.close().await {
        app_log!(warn, "Browser did not close cleanly: {:#}", e);
    }
    Ok(outcome)
}

async fn run_application(
    session: &BrowserSession,
    app: &AppConfig,
    oracle: Arc<dyn Oracle>,
    profile: &str,
    job_url: &str,
) -> Result<WizardOutcome> {
    let job_page = session.open(job_url).await?;
    let application = session
        .open_application(&job_page, &app.browser.apply_button, &app.timeouts)
        .await?;

    let controller = WizardController::new(&application, oracle, app, profile);
    Ok(controller.run().await)
}

/// `jk` query parameter when present (the listing key), otherwise the last path segment.
fn job_key(job_url: &str) -> String {
    let (path, query) = job_url.split_once('?').unwrap_or((job_url, ""));
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("jk="))
        .filter(|v| !v.is_empty())
        .or_else(|| path.trim_end_matches('/').rsplit('/').next())
        .unwrap_or(job_url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key() {
        assert_eq!(job_key("https://uk.example.com/viewjob?jk=abc123&from=serp"), "abc123");
        assert_eq!(job_key("https://example.com/jobs/rust-dev-42/"), "rust-dev-42");
    }

    #[test]
    fn test_cli_parses_apply() {
        let cli = Cli::try_parse_from([
            "autoapply",
            "apply",
            "--job-url",
            "https://example.com/viewjob?jk=1",
            "--job-title",
            "Rust Engineer",
        ])
        .unwrap();

        match cli.command {
            Command::Apply {
                job_url,
                job_title,
                job_id,
            } => {
                assert_eq!(job_url, "https://example.com/viewjob?jk=1");
                assert_eq!(job_title, "Rust Engineer");
                assert!(job_id.is_none());
            }
            _ => panic!("expected apply"),
        }
    }
}

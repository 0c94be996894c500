// src/core/fs_ops.rs
//! File system helpers and the review snapshot store

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::app_log;
use crate::config::SnapshotConfig;
use crate::utils::sanitize_file_component;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            app_log!(info, "Created directory: {}", path.display());
        }
        Ok(())
    }

    pub async fn read_file_safe(path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    pub async fn write_file_safe(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        app_log!(info, "Written file: {}", path.display());
        Ok(())
    }

    /// Move a file, falling back to copy + remove across file systems.
    pub async fn move_file(src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        if fs::rename(src, dest).await.is_err() {
            fs::copy(src, dest)
                .await
                .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
            fs::remove_file(src)
                .await
                .with_context(|| format!("Failed to remove {}", src.display()))?;
        }

        app_log!(info, "Moved {} to {}", src.display(), dest.display());
        Ok(())
    }
}

/// Where review-page snapshots go. A run writes to the staging file; the caller later
/// archives it under a name that correlates with the job.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    staging_path: PathBuf,
    submissions_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            staging_path: config.staging_path.clone(),
            submissions_dir: config.submissions_dir.clone(),
        }
    }

    /// Persist the full rendered page, replacing any previous staging snapshot.
    pub async fn persist(&self, html: &str) -> Result<PathBuf> {
        FsOps::write_file_safe(&self.staging_path, html)
            .await
            .context("Failed to persist review snapshot")?;
        Ok(self.staging_path.clone())
    }

    /// Move the staged snapshot to `<submissions_dir>/<job title> - <job id>.html`.
    /// Returns `None` when there is nothing staged.
    pub async fn archive(&self, job_title: &str, job_id: &str) -> Result<Option<PathBuf>> {
        if !self.staging_path.exists() {
            app_log!(warn, "No staged snapshot to archive for job {}", job_id);
            return Ok(None);
        }

        let file_name = format!(
            "{} - {}.html",
            sanitize_file_component(job_title),
            sanitize_file_component(job_id)
        );
        let destination = self.submissions_dir.join(file_name);
        FsOps::move_file(&self.staging_path, &destination).await?;
        Ok(Some(destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> SnapshotStore {
        SnapshotStore::new(&SnapshotConfig {
            staging_path: dir.join("staging").join("review.html"),
            submissions_dir: dir.join("Submissions"),
        })
    }

    #[tokio::test]
    async fn test_persist_then_archive_moves_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let staged = store.persist("<html>review</html>").await.unwrap();
        assert!(staged.exists());

        let archived = store
            .archive("Senior Rust / Backend Engineer", "abc123")
            .await
            .unwrap()
            .unwrap();

        assert!(!staged.exists());
        assert_eq!(
            archived.file_name().unwrap().to_str().unwrap(),
            "Senior Rust _ Backend Engineer - abc123.html"
        );
        assert_eq!(
            std::fs::read_to_string(&archived).unwrap(),
            "<html>review</html>"
        );
    }

    #[tokio::test]
    async fn test_archive_without_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.archive("Title", "id").await.unwrap().is_none());
    }
}

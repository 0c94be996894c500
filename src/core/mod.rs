// src/core/mod.rs
//! Configuration loading and file system services shared by the CLI and the wizard

pub mod config_manager;
pub mod fs_ops;

pub use config_manager::ConfigManager;
pub use fs_ops::{FsOps, SnapshotStore};

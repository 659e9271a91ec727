//! Common test utilities for habitual integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never read the
//! user's `~/.config/habitual/` or their store credentials.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Environment variables the binary reads; cleared for every command.
const HABITUAL_ENV: &[&str] = &[
    "HABITUAL_CONFIG",
    "HABITUAL_LOG",
    "HABITUAL_LOG_DIR",
    "NOTION_TOKEN",
    "DATABASE_ID",
    "DASHBOARD_PAGE_ID",
    "CLOUDINARY_CLOUD_NAME",
    "CLOUDINARY_API_KEY",
    "CLOUDINARY_API_SECRET",
    "CLOUDINARY_UPLOAD_FOLDER",
];

/// A test environment with an isolated config directory.
///
/// The `habitual()` method returns a `Command` that points `--config` at
/// `config.kdl` inside the temp directory, so tests are parallel-safe.
pub struct TestEnv {
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty config file.
    pub fn new() -> Self {
        let env = Self {
            config_dir: TempDir::new().unwrap(),
        };
        env.write_config("");
        env
    }

    /// Create a new test environment with `content` as config.kdl.
    pub fn with_config(content: &str) -> Self {
        let env = Self::new();
        env.write_config(content);
        env
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.kdl")
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).unwrap();
    }

    /// Get a Command for the habitual binary with isolated configuration.
    pub fn habitual(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_habitual"));
        for name in HABITUAL_ENV {
            cmd.env_remove(name);
        }
        cmd.env("HABITUAL_CONFIG", self.config_path());
        cmd.current_dir(self.config_dir.path());
        cmd
    }

    pub fn path(&self) -> &Path {
        self.config_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

//! Configuration loading from environment variables.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "study_lounge.db";

/// Runtime settings for the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub staff_code: String,
    pub student_code: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Expects `LOUNGE_STAFF_CODE` and `LOUNGE_STUDENT_CODE` to be set,
    /// either in the environment or in a `.env` file. `LOUNGE_DB` is
    /// optional and defaults to `study_lounge.db`.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve only the database path, for commands that never authenticate.
    pub fn db_path_from_env() -> PathBuf {
        let _ = dotenvy::dotenv();

        db_path_from(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let staff_code = lookup("LOUNGE_STAFF_CODE")
            .filter(|v| !v.trim().is_empty())
            .context("LOUNGE_STAFF_CODE environment variable not set")?;

        let student_code = lookup("LOUNGE_STUDENT_CODE")
            .filter(|v| !v.trim().is_empty())
            .context("LOUNGE_STUDENT_CODE environment variable not set")?;

        if staff_code.trim() == student_code.trim() {
            bail!("LOUNGE_STAFF_CODE and LOUNGE_STUDENT_CODE must differ");
        }

        Ok(Self {
            db_path: db_path_from(&lookup),
            staff_code: staff_code.trim().to_string(),
            student_code: student_code.trim().to_string(),
        })
    }
}

fn db_path_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("LOUNGE_DB")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}

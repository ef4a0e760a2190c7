//! Runtime configuration from the environment (optionally seeded by `.env`).

use crate::consts::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {0} env var")]
    MissingToken(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    token: Option<String>,
    pub data_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            token: non_empty(env::TOKEN),
            data_dir: non_empty(env::DATA_DIR)
                .unwrap_or_else(|| env::DEFAULT_DATA_DIR.to_string())
                .into(),
            reports_dir: non_empty(env::REPORTS_DIR)
                .unwrap_or_else(|| env::DEFAULT_REPORTS_DIR.to_string())
                .into(),
        }
    }

    /// Bot token; only the bot run needs it
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .ok_or(ConfigError::MissingToken(env::TOKEN))
    }
}

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::config::toolchain::{CompileConfig, FileExtension, RunConfig, Toolchain};
use crate::types::Language;

mod loader;
pub mod toolchain;

/// Example configuration embedded at compile time.
///
/// Also the base layer every loaded configuration is merged over.
pub const EXAMPLE_CONFIG: &str = include_str!("../../codebox.example.toml");

/// Prefix for environment variable overrides (e.g. `CODEBOX_TIMEOUT`)
pub const ENV_PREFIX: &str = "CODEBOX";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Codebox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Wall-clock limit for each run step, in seconds
    pub timeout: f64,

    /// Wall-clock limit for each compile step, in seconds.
    /// Falls back to `timeout` when unset.
    #[serde(default)]
    pub compile_timeout: Option<f64>,

    /// Maximum number of executions in flight at once
    pub max_concurrent: usize,

    /// Parent directory for workspaces (system temp dir if not specified)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Toolchains for each supported language
    pub languages: Languages,
}

/// Toolchain configuration for every supported language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Languages {
    pub python: Toolchain,
    pub java: Toolchain,
    pub cpp: Toolchain,
}

impl Languages {
    /// Get the toolchain for a language
    pub fn get(&self, language: Language) -> &Toolchain {
        match language {
            Language::Python => &self.python,
            Language::Java => &self.java,
            Language::Cpp => &self.cpp,
        }
    }
}

impl Config {
    /// Create a new config from the embedded defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the toolchain for a language
    pub fn toolchain(&self, language: Language) -> &Toolchain {
        self.languages.get(language)
    }

    /// Wall-clock limit for run steps
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    /// Wall-clock limit for compile steps
    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.compile_timeout.unwrap_or(self.timeout))
    }

    /// Directory under which workspaces are created
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

//! Configuration loading for Codebox
//!
//! Every configuration is layered: embedded defaults, then an optional TOML
//! file, then (for [`Config::load`]) `CODEBOX_*` environment variables.

use std::path::Path;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config as RawConfig, Environment, File, FileFormat};

use crate::config::{Config, ConfigError, ENV_PREFIX, EXAMPLE_CONFIG, Toolchain};
use crate::types::Language;

fn defaults() -> ConfigBuilder<DefaultState> {
    RawConfig::builder().add_source(File::from_str(EXAMPLE_CONFIG, FileFormat::Toml))
}

/// `CODEBOX_TIMEOUT`, `CODEBOX_MAX_CONCURRENT`, `CODEBOX_LANGUAGES__CPP__NAME`, ...
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = defaults();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder.add_source(environment()).build()?;
        Self::finish(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = defaults().add_source(File::from(path.as_ref())).build()?;
        Self::finish(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = defaults()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        Self::finish(config)
    }

    fn finish(raw: RawConfig) -> Result<Self, ConfigError> {
        let config: Config = raw.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Override the run step timeout, in seconds
    pub fn with_timeout(self, seconds: f64) -> Result<Self, ConfigError> {
        validate_seconds("timeout", seconds)?;
        Ok(Self {
            timeout: seconds,
            ..self
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        validate_seconds("timeout", self.timeout)?;
        if let Some(compile_timeout) = self.compile_timeout {
            validate_seconds("compile_timeout", compile_timeout)?;
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent must be at least 1".to_owned(),
            ));
        }

        for language in Language::ALL {
            validate_toolchain(language, self.toolchain(language))?;
        }

        Ok(())
    }
}

fn validate_seconds(key: &str, seconds: f64) -> Result<(), ConfigError> {
    // Duration::from_secs_f64 panics on anything outside this range
    if !seconds.is_finite() || seconds <= 0.0 || seconds > u32::MAX as f64 {
        return Err(ConfigError::Invalid(format!(
            "{key} must be a positive number of seconds, got {seconds}"
        )));
    }
    Ok(())
}

fn validate_toolchain(language: Language, toolchain: &Toolchain) -> Result<(), ConfigError> {
    if toolchain.name.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "language '{language}' has empty name"
        )));
    }
    if toolchain.extension.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "language '{language}' has empty extension"
        )));
    }
    if toolchain.run.command.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "language '{language}' has empty run command"
        )));
    }
    match (&toolchain.compile, language.is_compiled()) {
        (Some(compile), true) if compile.command.is_empty() => Err(ConfigError::Invalid(
            format!("language '{language}' has empty compile command"),
        )),
        (Some(_), true) => Ok(()),
        (None, true) => Err(ConfigError::Invalid(format!(
            "language '{language}' requires a compile command"
        ))),
        (Some(_), false) => Err(ConfigError::Invalid(format!(
            "language '{language}' is interpreted and cannot have a compile step"
        ))),
        (None, false) => Ok(()),
    }
}

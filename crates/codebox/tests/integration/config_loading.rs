use std::path::PathBuf;
use std::time::Duration;

use codebox::config::{Config, ConfigError};
use codebox::types::Language;

use super::FIXTURES_PATH;

fn fixture_config(name: &str) -> PathBuf {
    PathBuf::from(format!("{FIXTURES_PATH}/configs/{name}"))
}

#[test]
fn test_load_custom_timeouts() {
    let config =
        Config::from_file(fixture_config("custom_timeouts.toml")).expect("Failed to load config");

    assert_eq!(config.run_timeout(), Duration::from_millis(2500));
    assert_eq!(config.compile_timeout(), Duration::from_secs(20));
    assert_eq!(config.max_concurrent, 2);
    assert_eq!(config.workspace_root(), PathBuf::from("/var/tmp/codebox-test"));
    // Toolchains fall back to the embedded defaults
    assert_eq!(config.toolchain(Language::Python).name, "Python 3");
}

#[test]
fn test_load_custom_toolchain() {
    let config =
        Config::from_file(fixture_config("custom_toolchain.toml")).expect("Failed to load config");

    let cpp = config.toolchain(Language::Cpp);
    assert_eq!(cpp.name, "C++ (Clang)");
    assert_eq!(cpp.extension.to_string(), "cpp");
    let compile = cpp.compile.as_ref().unwrap();
    assert_eq!(compile.command[0], "clang++");
    assert_eq!(compile.output_name, "a");

    assert_eq!(config.toolchain(Language::Python).run.command[0], "pypy3");
    assert_eq!(config.run_timeout(), Duration::from_secs(5));
}

#[test]
fn test_load_invalid_empty_run_command() {
    let result = Config::from_file(fixture_config("invalid_empty_run_command.toml"));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_empty_compile_command() {
    let result = Config::from_file(fixture_config("invalid_empty_compile_command.toml"));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_interpreted_with_compile() {
    let result = Config::from_file(fixture_config("invalid_interpreted_with_compile.toml"));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_zero_timeout() {
    let result = Config::from_file(fixture_config("invalid_zero_timeout.toml"));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_extension() {
    let result = Config::from_file(fixture_config("invalid_extension.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_missing_file() {
    let result = Config::from_file(fixture_config("does_not_exist.toml"));
    assert!(result.is_err());
}

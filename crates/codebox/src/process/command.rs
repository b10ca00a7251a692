//! Command builder for toolchain and program processes

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Builder for a process invocation inside a workspace
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    /// Directory the process runs in
    working_dir: PathBuf,
    /// Program followed by its arguments
    command: Vec<String>,
    /// Extra environment variables
    env: HashMap<String, String>,
}

impl ProcessCommand {
    /// Create a new command builder running in `working_dir`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            command: Vec::new(),
            env: HashMap::new(),
        }
    }

    /// Set the command to run (program first)
    pub fn command(mut self, cmd: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command = cmd.into_iter().map(Into::into).collect();
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables
    pub fn envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Program to run, if a command has been set
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Arguments after the program
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    pub fn env_vars(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Full argument vector, for logging
    pub fn build(&self) -> Vec<String> {
        self.command.clone()
    }
}

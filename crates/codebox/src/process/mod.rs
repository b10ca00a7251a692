//! Subprocess execution
//!
//! Spawns one toolchain or program process at a time, merges its output
//! streams and bounds it with a wall-clock timeout.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use crate::process::command::ProcessCommand;
pub use crate::process::runner::{ProcessOutput, ProcessStatus, run};

mod command;
mod runner;

/// Errors that prevent a process from being run at all
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("empty command")]
    EmptyCommand,

    #[error("command '{0}' not found in PATH")]
    ProgramNotFound(String),

    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the program of a command to a path that can be spawned.
///
/// Bare names (like `g++`) are looked up on the host's PATH so that a
/// missing toolchain is reported by name. Relative paths containing a `/`
/// (like `./program`) are resolved against the working directory, since
/// relative program paths combined with a working directory are platform
/// dependent. Absolute paths are returned unchanged.
pub fn resolve_program(program: &str, working_dir: &Path) -> Result<PathBuf, ProcessError> {
    if program.is_empty() {
        return Err(ProcessError::EmptyCommand);
    }

    let path = Path::new(program);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    if program.contains('/') {
        return Ok(working_dir.join(path));
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    find_in_path(program, &path_var)
        .ok_or_else(|| ProcessError::ProgramNotFound(program.to_owned()))
}

fn find_in_path(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

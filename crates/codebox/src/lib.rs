//! A library for running short-lived code snippets.
//!
//! Codebox takes a block of source code and a language tag, runs it in a
//! freshly created workspace directory with the host's compiler or
//! interpreter, and returns the captured output or a classified failure.
//!
//! # Features
//!
//! - **Multi-language**: Python (interpreted), C++ (compiled to a binary) and
//!   Java (entry point renamed per run).
//! - **Disposable workspaces**: Each execution gets its own directory, removed on every exit path.
//! - **Wall-clock timeouts**: Runaway processes are killed together with their process group.
//! - **Admission gate**: A semaphore bounds how many executions run at once.
//! - **TOML configuration**: Toolchain commands, timeouts and paths, with environment overrides.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Toolchain};
pub use executor::{Executor, dispatch};
pub use pipeline::{Pipeline, PipelineError};
pub use process::ProcessError;
pub use types::{
    ExecutionRequest, ExecutionResult, ExecutionStatus, Language, SourceEncoding,
    UnsupportedLanguage,
};
pub use workspace::{Workspace, WorkspaceError, WorkspaceManager};

pub mod config;
pub mod executor;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod types;
pub mod workspace;

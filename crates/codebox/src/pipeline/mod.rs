//! Language pipelines
//!
//! A pipeline turns source text into files inside a workspace and runs one
//! or two processes there: an optional build step followed by the run step.
//! Stage failures (compile errors, timeouts, crashes) are reported as an
//! [`ExecutionResult`]; only host-level faults are returned as errors.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

pub use crate::pipeline::compiled::Compiled;
pub use crate::pipeline::interpreted::Interpreted;
pub use crate::pipeline::java::{IdentityRewrite, find_entry_point, rename_identifier};

mod compiled;
mod interpreted;
mod java;

use crate::config::{CompileConfig, Config, RunConfig, Toolchain};
use crate::output;
use crate::process::{self, ProcessCommand, ProcessError, ProcessOutput, ProcessStatus};
use crate::types::{ExecutionResult, ExecutionStatus, Language};
use crate::workspace::{Workspace, WorkspaceError};

/// Host-level faults raised while running a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    #[error("language '{0}' does not support compilation")]
    NotCompiled(String),
}

/// Wall-clock limits for the build and run steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    pub build: Duration,
    pub run: Duration,
}

impl StepTimeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            build: config.compile_timeout(),
            run: config.run_timeout(),
        }
    }
}

/// Build and run strategy for one language
#[derive(Debug, Clone)]
pub enum Pipeline {
    /// Source is handed straight to an interpreter (Python)
    Interpreted(Interpreted),

    /// Source is compiled to a native binary which is then executed (C++)
    Compiled(Compiled),

    /// Entry point type is renamed before compiling and running (Java)
    IdentityRewrite(IdentityRewrite),
}

impl Pipeline {
    /// Select the pipeline for a language using its configured toolchain
    pub fn for_language(language: Language, config: &Config) -> Self {
        let toolchain = config.toolchain(language).clone();
        let timeouts = StepTimeouts::from_config(config);
        match language {
            Language::Python => Self::Interpreted(Interpreted {
                toolchain,
                timeouts,
            }),
            Language::Cpp => Self::Compiled(Compiled {
                toolchain,
                timeouts,
            }),
            Language::Java => Self::IdentityRewrite(IdentityRewrite {
                toolchain,
                timeouts,
            }),
        }
    }

    /// Toolchain this pipeline runs
    pub fn toolchain(&self) -> &Toolchain {
        match self {
            Self::Interpreted(p) => &p.toolchain,
            Self::Compiled(p) => &p.toolchain,
            Self::IdentityRewrite(p) => &p.toolchain,
        }
    }

    /// Run `source` inside `workspace`
    pub async fn execute(
        &self,
        workspace: &Workspace,
        source: &str,
    ) -> Result<ExecutionResult, PipelineError> {
        match self {
            Self::Interpreted(p) => p.execute(workspace, source).await,
            Self::Compiled(p) => p.execute(workspace, source).await,
            Self::IdentityRewrite(p) => p.execute(workspace, source).await,
        }
    }
}

/// Run the build step; returns the failure result if the build failed
pub(crate) async fn build_step(
    workspace: &Workspace,
    compile: &CompileConfig,
    source_name: &str,
    binary: &str,
    timeout: Duration,
    restore: impl Fn(ProcessOutput) -> ProcessOutput,
) -> Result<Option<ExecutionResult>, PipelineError> {
    let command = ProcessCommand::new(workspace.path())
        .command(Toolchain::expand_command(&compile.command, source_name, binary))
        .envs(&compile.env);

    let output = restore(process::run(&command, timeout).await?);
    debug!(status = ?output.status, elapsed = ?output.elapsed, "build finished");
    Ok(classify_build(&output))
}

/// Run the program and classify how it ended
pub(crate) async fn run_step(
    workspace: &Workspace,
    run: &RunConfig,
    source_name: &str,
    binary: &str,
    timeout: Duration,
    restore: impl Fn(ProcessOutput) -> ProcessOutput,
) -> Result<ExecutionResult, PipelineError> {
    let command = ProcessCommand::new(workspace.path())
        .command(Toolchain::expand_command(&run.command, source_name, binary))
        .envs(&run.env);

    let output = restore(process::run(&command, timeout).await?);
    debug!(status = ?output.status, elapsed = ?output.elapsed, "run finished");
    Ok(classify_run(&output))
}

/// A build fails if it timed out, exited nonzero or printed anything
fn classify_build(output: &ProcessOutput) -> Option<ExecutionResult> {
    match output.status {
        ProcessStatus::TimedOut(limit) => Some(ExecutionResult::new(
            ExecutionStatus::Timeout,
            output::timeout(limit),
        )),
        ProcessStatus::Exited(0) if output.output.is_empty() => None,
        _ => Some(
            ExecutionResult::new(
                ExecutionStatus::CompileError,
                output::compile_error(&output.output, output.exit_code()),
            )
            .with_exit_code(output.exit_code()),
        ),
    }
}

fn classify_run(output: &ProcessOutput) -> ExecutionResult {
    match output.status {
        ProcessStatus::TimedOut(limit) => {
            ExecutionResult::new(ExecutionStatus::Timeout, output::timeout(limit))
        }
        ProcessStatus::Exited(0) => {
            ExecutionResult::new(ExecutionStatus::Success, output::normalize(&output.output))
                .with_exit_code(Some(0))
        }
        ProcessStatus::Exited(_) | ProcessStatus::Signaled(_) => ExecutionResult::new(
            ExecutionStatus::RuntimeFailure,
            output::runtime_failure(&output.output, output.exit_code()),
        )
        .with_exit_code(output.exit_code()),
    }
}

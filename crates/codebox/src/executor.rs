//! Top-level execution entry point
//!
//! Maps a language tag to its pipeline, bounds how many executions run at
//! once, gives each execution its own workspace and turns host-level faults
//! into an `InternalError` result. Every request yields an
//! [`ExecutionResult`]; nothing here returns an error.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::output;
use crate::pipeline::{Pipeline, PipelineError};
use crate::types::{
    ExecutionRequest, ExecutionResult, ExecutionStatus, Language, UnsupportedLanguage,
};
use crate::workspace::WorkspaceManager;

/// Select the pipeline for a language tag
///
/// Unknown tags are rejected without touching the filesystem.
pub fn dispatch(tag: &str, config: &Config) -> Result<Pipeline, UnsupportedLanguage> {
    let language: Language = tag.parse()?;
    Ok(Pipeline::for_language(language, config))
}

/// Runs execution requests against the configured toolchains
#[derive(Debug, Clone)]
pub struct Executor {
    config: Config,
    workspaces: WorkspaceManager,
    gate: Arc<Semaphore>,
}

impl Executor {
    /// Create a new executor with the given configuration
    pub fn new(config: Config) -> Self {
        let workspaces = WorkspaceManager::new(config.workspace_root());
        let gate = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            config,
            workspaces,
            gate,
        }
    }

    /// Create a new executor with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of executions that could start right now
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    /// Execute raw source code in the given language
    pub async fn run_code(&self, language: &str, source: &str) -> ExecutionResult {
        self.execute(&ExecutionRequest::new(language, source)).await
    }

    /// Execute one request
    #[instrument(skip(self, request), fields(language = %request.language))]
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();

        let pipeline = match dispatch(&request.language, &self.config) {
            Ok(pipeline) => pipeline,
            Err(unsupported) => {
                info!("rejected unsupported language");
                return ExecutionResult::new(
                    ExecutionStatus::UnsupportedLanguage,
                    unsupported.to_string(),
                )
                .finished(started.elapsed());
            }
        };

        // Held until the workspace has been released
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                warn!(error = %e, "admission gate closed");
                return internal_error(&e).finished(started.elapsed());
            }
        };
        debug!(waited = ?started.elapsed(), "admitted");

        let source = request.program_text();
        let result = match self.run_isolated(&pipeline, &source).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "execution failed on the host");
                internal_error(&e)
            }
        };

        let elapsed = started.elapsed();
        info!(status = %result.status(), ?elapsed, "execution finished");
        result.finished(elapsed)
    }

    /// Run a pipeline in a fresh workspace, releasing it on every path
    async fn run_isolated(
        &self,
        pipeline: &Pipeline,
        source: &str,
    ) -> Result<ExecutionResult, PipelineError> {
        let workspace = self.workspaces.acquire().await?;
        let result = pipeline.execute(&workspace, source).await;
        self.workspaces.release(workspace).await;
        result
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn internal_error(error: &dyn std::error::Error) -> ExecutionResult {
    ExecutionResult::new(ExecutionStatus::InternalError, output::internal_error(error))
}

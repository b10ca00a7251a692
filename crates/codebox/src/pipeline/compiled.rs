//! Ahead-of-time compiled pipeline: build a native binary, then execute it

use tracing::{debug, instrument};

use crate::config::Toolchain;
use crate::pipeline::{PipelineError, StepTimeouts, build_step, run_step};
use crate::types::ExecutionResult;
use crate::workspace::Workspace;

/// Language compiled to a binary inside the workspace
#[derive(Debug, Clone)]
pub struct Compiled {
    pub(crate) toolchain: Toolchain,
    pub(crate) timeouts: StepTimeouts,
}

impl Compiled {
    #[instrument(skip_all, fields(workspace = %workspace.id()))]
    pub async fn execute(
        &self,
        workspace: &Workspace,
        source: &str,
    ) -> Result<ExecutionResult, PipelineError> {
        let compile = self
            .toolchain
            .compile
            .as_ref()
            .ok_or_else(|| PipelineError::NotCompiled(self.toolchain.name.clone()))?;

        let source_name = self.toolchain.source_name();
        workspace.write_file(&source_name, source.as_bytes()).await?;

        // Artifact name is unique per workspace
        let binary = format!("{}_{}", compile.output_name, workspace.id().simple());
        debug!(source_name, binary, "compiling");

        if let Some(failed) = build_step(
            workspace,
            compile,
            &source_name,
            &binary,
            self.timeouts.build,
            std::convert::identity,
        )
        .await?
        {
            return Ok(failed);
        }

        run_step(
            workspace,
            &self.toolchain.run,
            &source_name,
            &binary,
            self.timeouts.run,
            std::convert::identity,
        )
        .await
    }
}

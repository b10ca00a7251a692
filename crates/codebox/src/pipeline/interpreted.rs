//! Interpreted pipeline: write the source and hand it to the interpreter

use tracing::{debug, instrument};

use crate::config::Toolchain;
use crate::pipeline::{PipelineError, StepTimeouts, run_step};
use crate::types::ExecutionResult;
use crate::workspace::Workspace;

/// Language run directly from source
#[derive(Debug, Clone)]
pub struct Interpreted {
    pub(crate) toolchain: Toolchain,
    pub(crate) timeouts: StepTimeouts,
}

impl Interpreted {
    #[instrument(skip_all, fields(workspace = %workspace.id()))]
    pub async fn execute(
        &self,
        workspace: &Workspace,
        source: &str,
    ) -> Result<ExecutionResult, PipelineError> {
        let source_name = self.toolchain.source_name();
        workspace.write_file(&source_name, source.as_bytes()).await?;
        debug!(source_name, "wrote source file");

        run_step(
            workspace,
            &self.toolchain.run,
            &source_name,
            &self.toolchain.stem,
            self.timeouts.run,
            std::convert::identity,
        )
        .await
    }
}

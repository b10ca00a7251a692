//! Workspace lifecycle management
//!
//! Every execution gets its own freshly created directory, which is removed
//! when the execution ends.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Prefix of every workspace directory name
pub const WORKSPACE_PREFIX: &str = "codebox-";

/// Errors that occur while provisioning or writing to a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace at {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Creates workspaces under a common root directory
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory under which workspaces are created
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new, uniquely named workspace
    ///
    /// The leaf directory is created with `create_dir`, so an existing
    /// directory of the same name is an error rather than being reused.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn acquire(&self) -> Result<Workspace, WorkspaceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| WorkspaceError::CreateFailed {
                path: self.root.clone(),
                source,
            })?;

        let id = Uuid::new_v4();
        let path = self.root.join(format!("{WORKSPACE_PREFIX}{}", id.simple()));
        tokio::fs::create_dir(&path)
            .await
            .map_err(|source| WorkspaceError::CreateFailed {
                path: path.clone(),
                source,
            })?;

        debug!(?path, "workspace created");

        Ok(Workspace {
            id,
            path,
            released: false,
        })
    }

    /// Remove a workspace and everything in it
    pub async fn release(&self, workspace: Workspace) {
        workspace.release().await;
    }
}

/// A directory owned by exactly one execution
///
/// # Cleanup
///
/// Call [`release()`](Self::release) when the execution ends. Dropping an
/// unreleased workspace logs a warning and removes the directory
/// synchronously, so a panicking pipeline still leaves nothing behind.
#[derive(Debug)]
pub struct Workspace {
    /// Unique workspace ID
    id: Uuid,

    /// Path to the workspace directory
    path: PathBuf,

    /// Whether the directory has already been removed
    released: bool,
}

impl Workspace {
    /// Get the workspace ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the path to a file inside the workspace
    ///
    /// Returns an error if the path contains path traversal attempts.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        if name.is_empty() || name.contains("..") || name.starts_with('/') {
            return Err(WorkspaceError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.path.join(name))
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let path = self.file_path(name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content).await?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(())
    }

    /// Check if a file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, WorkspaceError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    /// Remove the workspace directory, deepest entries first
    ///
    /// Failures are logged and otherwise ignored; they never affect the
    /// result of the execution that used the workspace.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn release(mut self) {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "workspace removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "workspace already gone");
            }
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove workspace"
            ),
        }
    }

    /// Check if the workspace has been released
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        warn!(
            id = %self.id,
            path = %self.path.display(),
            "Workspace dropped without release, removing synchronously"
        );

        if let Err(e) = std::fs::remove_dir_all(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "failed to remove workspace");
        }
    }
}

//! Scoped ownership of the temporary download file

use crate::download::remove_if_exists;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Temporary download file owned by one attempt
///
/// [`TempArtifact::remove`] deletes the file and consumes the guard. If the
/// guard is dropped without being removed (the attempt future was dropped),
/// the file is deleted synchronously in `Drop`.
#[derive(Debug)]
pub(crate) struct TempArtifact {
    path: PathBuf,
    removed: bool,
}

impl TempArtifact {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file; a file that was never created counts as removed
    pub(crate) async fn remove(mut self) -> std::io::Result<()> {
        self.removed = true;
        let result = remove_if_exists(&self.path).await;
        if result.is_ok() {
            debug!(path = %self.path.display(), "removed temp artifact");
        }
        result
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed abandoned temp artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove temp artifact"),
        }
    }
}

//! Per-run temporary directory

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tubely_core::constants::RUN_DIR_PREFIX;

/// Owns every temporary artifact of one pipeline run.
///
/// Artifacts live in a private directory that is removed when the scope is
/// closed or dropped, so an early return or a cancelled future still cleans
/// up.
pub struct RunScope {
    dir: TempDir,
    artifacts: Vec<PathBuf>,
}

impl RunScope {
    /// Create a fresh run directory under `parent` (created if missing).
    pub fn new(parent: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(RUN_DIR_PREFIX)
            .tempdir_in(parent)?;
        Ok(Self {
            dir,
            artifacts: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Record a file created inside the run directory.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.artifacts.push(path.into());
    }

    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Remove all artifacts and the directory, reporting failures.
    pub fn close(self) -> io::Result<()> {
        for artifact in &self.artifacts {
            match std::fs::remove_file(artifact) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(error = %e, path = %artifact.display(), "Failed to remove artifact");
                }
            }
        }
        self.dir.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_removes_directory_and_artifacts() {
        let parent = tempfile::tempdir().unwrap();
        let mut scope = RunScope::new(parent.path()).unwrap();
        let run_dir = scope.path().to_path_buf();

        let artifact = run_dir.join("a.mp4");
        std::fs::write(&artifact, b"data").unwrap();
        scope.track(&artifact);
        std::fs::write(run_dir.join("untracked.mp4"), b"data").unwrap();

        assert!(run_dir.starts_with(parent.path()));
        assert_eq!(scope.artifacts(), [artifact.clone()]);

        scope.close().unwrap();
        assert!(!run_dir.exists());
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn drop_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let run_dir = {
            let scope = RunScope::new(parent.path()).unwrap();
            std::fs::write(scope.path().join("x"), b"1").unwrap();
            scope.path().to_path_buf()
        };
        assert!(!run_dir.exists());
    }

    #[test]
    fn missing_parent_is_created() {
        let parent = tempfile::tempdir().unwrap();
        let nested = parent.path().join("uploads/tmp");
        let scope = RunScope::new(&nested).unwrap();
        assert!(scope.path().starts_with(&nested));
    }
}

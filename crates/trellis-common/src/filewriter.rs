//! File writer abstraction for workflow outputs.
//!
//! Workflows persist two kinds of artifacts: the final cluster config and
//! the per-cluster checkpoint file. Both go through this trait so tests
//! can redirect them and so temporary files are cleaned up on every exit
//! path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Name of the scratch subdirectory inside a writer's directory
const TEMP_DIR_NAME: &str = "generated";

/// Destination for workflow artifacts
pub trait FileWriter: Send + Sync {
    /// Write `content` to `file_name` inside the writer's directory,
    /// replacing any previous content in full. Returns the written path.
    fn write(&self, file_name: &str, content: &[u8]) -> Result<PathBuf>;

    /// Directory this writer persists durable artifacts into
    fn dir(&self) -> &Path;

    /// Scratch directory for temporary files
    fn temp_dir(&self) -> &Path;

    /// Remove every temporary file produced during this invocation
    fn clean_up_temp(&self) -> Result<()>;
}

/// File writer rooted at a directory on the local filesystem.
///
/// Creating the writer creates the directory and its scratch
/// subdirectory. Dropping the writer removes the scratch subdirectory,
/// so temporary files never outlive the invocation that produced them.
#[derive(Debug)]
pub struct DirectoryWriter {
    dir: PathBuf,
    temp_dir: PathBuf,
}

impl DirectoryWriter {
    /// Create a writer rooted at `dir`, creating it if necessary
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let temp_dir = dir.join(TEMP_DIR_NAME);
        fs::create_dir_all(&temp_dir)
            .map_err(|e| Error::file(temp_dir.display().to_string(), e))?;
        Ok(Self { dir, temp_dir })
    }
}

impl FileWriter for DirectoryWriter {
    fn write(&self, file_name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        fs::write(&path, content).map_err(|e| Error::file(path.display().to_string(), e))?;
        Ok(path)
    }

    fn dir(&self) -> &Path {
        &self.dir
    }

    fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn clean_up_temp(&self) -> Result<()> {
        if self.temp_dir.exists() {
            fs::remove_dir_all(&self.temp_dir)
                .map_err(|e| Error::file(self.temp_dir.display().to_string(), e))?;
        }
        Ok(())
    }
}

impl Drop for DirectoryWriter {
    fn drop(&mut self) {
        if self.temp_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.temp_dir) {
                tracing::warn!(
                    path = %self.temp_dir.display(),
                    error = %e,
                    "failed to clean up temporary files"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_file_in_dir() {
        let root = tempfile::tempdir().unwrap();
        let writer = DirectoryWriter::new(root.path().join("out")).unwrap();

        let path = writer.write("cluster.yaml", b"name: test").unwrap();
        assert_eq!(path, root.path().join("out/cluster.yaml"));
        assert_eq!(fs::read(&path).unwrap(), b"name: test");
    }

    #[test]
    fn test_write_overwrites_in_full() {
        let root = tempfile::tempdir().unwrap();
        let writer = DirectoryWriter::new(root.path().join("out")).unwrap();

        writer.write("f.yaml", b"first version, long content").unwrap();
        let path = writer.write("f.yaml", b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_temp_dir_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let temp_path;
        {
            let writer = DirectoryWriter::new(root.path().join("out")).unwrap();
            temp_path = writer.temp_dir().to_path_buf();
            fs::write(temp_path.join("scratch.txt"), b"x").unwrap();
            assert!(temp_path.exists());
        }
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_clean_up_temp_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let writer = DirectoryWriter::new(root.path().join("out")).unwrap();
        writer.clean_up_temp().unwrap();
        writer.clean_up_temp().unwrap();
    }
}

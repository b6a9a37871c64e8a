use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::naming::derived_name;
use crate::types::PageContent;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output folder unavailable: {0}")]
    Folder(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Where a save landed: a fresh file, or an existing one left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Writes fetched pages under a root directory, one folder per story.
/// Holds no cross-call state; every save is self-contained.
#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `content` to a folder and file derived from the hints.
    /// Writing is exactly-once: an existing file is never overwritten,
    /// even when two concurrent savers resolve to the same derived path.
    pub async fn save(
        &self,
        folder_hint: &str,
        file_hint: &str,
        content: &PageContent,
    ) -> Result<SaveOutcome, PersistError> {
        let folder = self.root.join(derived_name(folder_hint));
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|err| PersistError::Folder(err.to_string()))?;

        let path = folder.join(derived_name(file_hint));
        // Exclusive create: losing the race to another saver is a no-op.
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Ok(SaveOutcome::Skipped(path));
            }
            Err(err) => return Err(PersistError::Io(err)),
        };

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        // The save only counts once the bytes reach stable storage.
        file.sync_all().await?;
        Ok(SaveOutcome::Written(path))
    }
}

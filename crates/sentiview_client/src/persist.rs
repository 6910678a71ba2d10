use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` if needed and make sure files can be created in it.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// One file that is only ever replaced whole: readers see either the old
/// content or the new one.
#[derive(Debug, Clone)]
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn write(&self, content: &str) -> Result<(), PersistError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        ensure_state_dir(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}

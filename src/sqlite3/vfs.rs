//! Directory-backed stand-in for browser origin-private storage, and the
//! `file:<name>?vfs=opfs` addressing scheme the worker opens files by.

use crate::error::StoreError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const OPFS_VFS: &str = "opfs";

/// Flat file store rooted at one directory. Files are addressed by bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginStorage {
    root: PathBuf,
}

impl OriginStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn file_path(&self, filename: &str) -> Result<PathBuf, StoreError> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }

    pub async fn read_file(&self, filename: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.file_path(filename)?;
        Ok(tokio::fs::read(path).await?)
    }

    /// Writes `bytes` to a sibling temp file of `filename`. The target is not
    /// touched until [`StagedFile::commit`] renames the temp file over it.
    pub async fn stage_file(&self, filename: &str, bytes: &[u8]) -> Result<StagedFile, StoreError> {
        let path = self.file_path(filename)?;
        self.ensure_root().await?;
        let tmp = self.root.join(format!(".{filename}.upload"));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(StagedFile {
            tmp,
            path,
            len: bytes.len(),
        })
    }
}

/// A fully written temp file waiting to be renamed over its target.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    path: PathBuf,
    len: usize,
}

impl StagedFile {
    pub async fn commit(self) -> Result<(), StoreError> {
        if let Err(e) = tokio::fs::rename(&self.tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&self.tmp).await;
            return Err(e.into());
        }
        debug!(path = %self.path.display(), len = self.len, "storage file written");
        Ok(())
    }
}

/// Filenames are single path components without URI syntax.
pub fn validate_filename(filename: &str) -> Result<(), StoreError> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '\0'));
    if bad {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// A `file:` URI naming a database file and the VFS that stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsUri {
    filename: String,
    vfs: String,
}

impl VfsUri {
    pub fn opfs(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            vfs: OPFS_VFS.to_string(),
        }
    }

    pub fn parse(uri: &str) -> Result<Self, StoreError> {
        let unsupported = || StoreError::UnsupportedVfs(uri.to_string());
        let rest = uri.strip_prefix("file:").ok_or_else(unsupported)?;
        let (filename, query) = rest.split_once('?').ok_or_else(unsupported)?;
        let vfs = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "vfs")
            .map(|(_, v)| v)
            .ok_or_else(unsupported)?;
        validate_filename(filename)?;
        Ok(Self {
            filename: filename.to_string(),
            vfs: vfs.to_string(),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn vfs(&self) -> &str {
        &self.vfs
    }
}

impl fmt::Display for VfsUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file:{}?vfs={}", self.filename, self.vfs)
    }
}

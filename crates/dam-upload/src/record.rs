//! File records the uploader relocates
//!
//! A record is the host's bookkeeping entry for one stored file. The uploader
//! only needs its name, its bytes and a way to point it at a new location.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Minimal view of a host file record
#[async_trait]
pub trait FileRecord: Send + Sync {
    /// Name sent to the DAM service
    fn filename(&self) -> &str;

    /// Current location of the file (a path or a URI)
    fn location(&self) -> &str;

    /// The file's bytes
    async fn read_bytes(&self) -> Result<Vec<u8>>;

    /// Point the record at `uri`
    async fn set_location(&mut self, uri: &str) -> Result<()>;
}

/// Record for a file saved on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileRecord {
    path: PathBuf,
    filename: String,
    location: String,
}

impl LocalFileRecord {
    /// Record for `path`, named after the file's final component
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Path has no usable file name: {}", path.display()))?
            .to_string();
        let location = path.display().to_string();
        Ok(Self {
            path,
            filename,
            location,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileRecord for LocalFileRecord {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn location(&self) -> &str {
        &self.location
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read file: {}", self.path.display()))
    }

    async fn set_location(&mut self, uri: &str) -> Result<()> {
        self.location = uri.to_string();
        Ok(())
    }
}

/// Record whose bytes live in memory
#[derive(Debug, Clone)]
pub struct MemoryFileRecord {
    filename: String,
    bytes: Vec<u8>,
    location: String,
}

impl MemoryFileRecord {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let filename = filename.into();
        Self {
            location: format!("memory://{filename}"),
            filename,
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl FileRecord for MemoryFileRecord {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn location(&self) -> &str {
        &self.location
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }

    async fn set_location(&mut self, uri: &str) -> Result<()> {
        self.location = uri.to_string();
        Ok(())
    }
}

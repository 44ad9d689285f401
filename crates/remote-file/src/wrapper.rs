//! Scheme-level entry point for remote file handles

use crate::{FileStat, HttpClient, RemoteFileStream, StreamError, UrlTranslator};
use std::path::PathBuf;
use std::sync::Arc;

/// Handler for one virtual URI scheme
///
/// Holds the HTTP capability and the rewrite rules shared by every handle it
/// creates. Cloning is cheap.
#[derive(Clone)]
pub struct RemoteFs {
    client: Arc<dyn HttpClient>,
    translator: Arc<UrlTranslator>,
}

impl RemoteFs {
    pub fn new(client: Arc<dyn HttpClient>, translator: UrlTranslator) -> Self {
        Self {
            client,
            translator: Arc::new(translator),
        }
    }

    pub fn scheme(&self) -> &str {
        self.translator.scheme()
    }

    pub fn translator(&self) -> &UrlTranslator {
        &self.translator
    }

    /// A fresh, unopened handle
    pub fn stream(&self) -> RemoteFileStream {
        RemoteFileStream::new(self.client.clone(), self.translator.clone())
    }

    /// Open `uri` with `mode` and return the handle
    pub async fn open(&self, uri: &str, mode: &str) -> Result<RemoteFileStream, StreamError> {
        let mut stream = self.stream();
        stream.open(uri, mode).await?;
        Ok(stream)
    }

    /// Size of `uri` without opening a handle
    pub async fn url_stat(&self, uri: &str) -> Result<FileStat, StreamError> {
        RemoteFileStream::bound(self.client.clone(), self.translator.clone(), uri)
            .stat()
            .await
    }

    /// Public URL a browser should use for `uri`
    pub fn external_url(&self, uri: &str) -> Result<String, StreamError> {
        self.translator.translate(uri)
    }

    /// Remote files never have a local path
    pub fn realpath(&self, _uri: &str) -> Option<PathBuf> {
        None
    }

    /// Parent of `uri` within the scheme
    ///
    /// `dam://a/b.jpg` has parent `dam://a`; top-level files have `dam://`.
    pub fn dirname(&self, uri: &str) -> String {
        let prefix = format!("{}://", self.scheme());
        let target = uri.strip_prefix(&prefix).unwrap_or(uri);
        let target = target.trim_end_matches('/');
        let parent = target.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        format!("{prefix}{parent}")
    }

    /// Delete `uri`
    ///
    /// The remote asset is left in place. The call still succeeds so the
    /// caller can drop its own record of the file; the return value is
    /// `false` because nothing was deleted remotely.
    pub fn unlink(&self, uri: &str) -> Result<bool, StreamError> {
        tracing::info!("Unlink of {} leaves the remote asset in place", uri);
        Ok(false)
    }

    pub fn rename(&self, _from: &str, _to: &str) -> Result<(), StreamError> {
        Err(StreamError::UnsupportedOperation("rename"))
    }

    pub fn mkdir(&self, _uri: &str) -> Result<(), StreamError> {
        Err(StreamError::UnsupportedOperation("mkdir"))
    }

    pub fn rmdir(&self, _uri: &str) -> Result<(), StreamError> {
        Err(StreamError::UnsupportedOperation("rmdir"))
    }

    pub fn opendir(&self, _uri: &str) -> Result<(), StreamError> {
        Err(StreamError::UnsupportedOperation("opendir"))
    }
}

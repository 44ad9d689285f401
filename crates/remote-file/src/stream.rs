//! Read-only file handle over a remote asset
//!
//! The whole resource is fetched with a single GET the first time content is
//! needed and kept in memory until the handle is closed. Every remote failure
//! (transport error, non-success status, empty body) collapses into an
//! "absent" state that is also memoized: a handle never retries.

use crate::{HttpClient, StreamError, UrlTranslator};
use bytes::Bytes;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

/// Mode a handle was opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
}

impl OpenMode {
    /// Parse an fopen-style mode string
    ///
    /// `r`, `rb` and `rt` open for reading. Anything that writes, appends,
    /// creates or updates (`w`, `a`, `x`, `c`, `r+`, ...) is rejected.
    pub fn parse(mode: &str) -> Result<Self, StreamError> {
        let base: String = mode.chars().filter(|c| !matches!(c, 'b' | 't')).collect();
        match base.as_str() {
            "r" => Ok(OpenMode::Read),
            _ => Err(StreamError::InvalidMode(mode.to_string())),
        }
    }
}

/// Origin for [`RemoteFileStream::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// Size information for a remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
}

impl FileStat {
    /// Remote assets are always regular files
    pub fn is_file(&self) -> bool {
        true
    }

    pub fn is_readonly(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
enum Content {
    Unfetched,
    Absent,
    Loaded(Bytes),
}

/// A virtual read-only file handle for one `scheme://path` URI
pub struct RemoteFileStream {
    client: Arc<dyn HttpClient>,
    translator: Arc<UrlTranslator>,
    uri: Option<String>,
    mode: Option<OpenMode>,
    content: Content,
    cursor: usize,
    closed: bool,
}

impl RemoteFileStream {
    /// Create an unopened handle
    pub fn new(client: Arc<dyn HttpClient>, translator: Arc<UrlTranslator>) -> Self {
        Self {
            client,
            translator,
            uri: None,
            mode: None,
            content: Content::Unfetched,
            cursor: 0,
            closed: false,
        }
    }

    /// Handle bound to `uri` without opening it (mode stays unset)
    pub(crate) fn bound(
        client: Arc<dyn HttpClient>,
        translator: Arc<UrlTranslator>,
        uri: &str,
    ) -> Self {
        let mut stream = Self::new(client, translator);
        stream.uri = Some(uri.to_string());
        stream
    }

    /// Open `uri` for reading and fetch its content
    ///
    /// Non-read modes fail before any network activity and leave the handle
    /// untouched. The open fails if the remote content cannot be fetched.
    pub async fn open(&mut self, uri: &str, mode: &str) -> Result<(), StreamError> {
        if self.closed || self.uri.is_some() {
            return Err(StreamError::HandleClosed);
        }
        let mode = OpenMode::parse(mode)?;
        self.translator.translate(uri)?;

        self.uri = Some(uri.to_string());
        self.mode = Some(mode);
        self.cursor = 0;

        match self.fetch_content().await {
            Some(_) => Ok(()),
            None => Err(StreamError::FetchFailure),
        }
    }

    /// Content of the resource, fetched on first call
    ///
    /// Later calls return the memoized result, including a memoized failure.
    pub async fn fetch_content(&mut self) -> Option<Bytes> {
        if self.closed {
            return None;
        }
        if let Content::Unfetched = self.content {
            self.content = match self.load().await {
                Some(bytes) => Content::Loaded(bytes),
                None => Content::Absent,
            };
        }
        match &self.content {
            Content::Loaded(bytes) => Some(bytes.clone()),
            Content::Unfetched | Content::Absent => None,
        }
    }

    async fn load(&self) -> Option<Bytes> {
        let uri = self.uri.as_deref()?;
        let url = match self.translator.translate(uri) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot fetch {}: {}", uri, e);
                return None;
            }
        };

        match self.client.get(&url).await {
            Ok(response) if !response.is_success() => {
                tracing::warn!(
                    "Fetching {} from {} failed with status {}",
                    uri,
                    url,
                    response.status
                );
                None
            }
            Ok(response) if response.body.is_empty() => {
                tracing::warn!("Fetching {} from {} returned an empty body", uri, url);
                None
            }
            Ok(response) => {
                tracing::debug!("Fetched {} bytes for {}", response.body.len(), uri);
                Some(response.body)
            }
            Err(e) => {
                tracing::warn!("Fetching {} from {} failed: {:#}", uri, url, e);
                None
            }
        }
    }

    fn loaded(&self) -> Result<&Bytes, StreamError> {
        if self.closed {
            return Err(StreamError::HandleClosed);
        }
        match &self.content {
            Content::Loaded(bytes) => Ok(bytes),
            Content::Unfetched | Content::Absent => Err(StreamError::FetchFailure),
        }
    }

    /// Read up to `max_bytes` from the cursor and advance it
    ///
    /// Fails with [`StreamError::EndOfData`] once the cursor reaches the end.
    pub fn read(&mut self, max_bytes: usize) -> Result<Bytes, StreamError> {
        self.take(max_bytes)
    }

    fn take(&mut self, max_bytes: usize) -> Result<Bytes, StreamError> {
        let content = self.loaded()?;
        let remaining = content.len().saturating_sub(self.cursor);
        if remaining == 0 {
            return Err(StreamError::EndOfData);
        }
        let n = max_bytes.min(remaining);
        let chunk = content.slice(self.cursor..self.cursor + n);
        self.cursor += n;
        Ok(chunk)
    }

    /// Move the cursor to `offset`
    ///
    /// Only [`Whence::Start`] is supported. Offsets past the end of the
    /// content fail and leave the cursor where it was.
    pub fn seek(&mut self, offset: u64, whence: Whence) -> Result<(), StreamError> {
        match whence {
            Whence::Start => self.seek_to(offset),
            Whence::Current | Whence::End => Err(StreamError::UnsupportedOperation(
                "seek relative to current position or end",
            )),
        }
    }

    fn seek_to(&mut self, offset: u64) -> Result<(), StreamError> {
        let len = self.loaded()?.len() as u64;
        if offset > len {
            return Err(StreamError::OutOfRange { offset, len });
        }
        self.cursor = offset as usize;
        Ok(())
    }

    pub fn tell(&self) -> u64 {
        self.cursor as u64
    }

    /// Whether the cursor sits at the end of the content
    ///
    /// Absent or unfetched content counts as zero-length, so a handle whose fetch
    /// failed reports `true`.
    pub fn eof(&self) -> bool {
        let len = match &self.content {
            Content::Loaded(bytes) => bytes.len(),
            Content::Unfetched | Content::Absent => 0,
        };
        self.cursor == len
    }

    /// Size of the resource
    ///
    /// Asks the server with HEAD first; without a `Content-Length` the
    /// (memoized) content is fetched and measured.
    pub async fn stat(&mut self) -> Result<FileStat, StreamError> {
        if self.closed {
            return Err(StreamError::HandleClosed);
        }
        if let Content::Absent = self.content {
            return Err(StreamError::FetchFailure);
        }
        let uri = self.uri.clone().ok_or(StreamError::HandleClosed)?;
        let url = self.translator.translate(&uri)?;

        match self.client.head(&url).await {
            Ok(response) if response.is_success() => {
                if let Some(size) = response.content_length {
                    return Ok(FileStat { size });
                }
                tracing::debug!("HEAD {} has no Content-Length, fetching body", url);
            }
            Ok(response) => {
                tracing::debug!("HEAD {} returned status {}", url, response.status);
            }
            Err(e) => {
                tracing::debug!("HEAD {} failed: {:#}", url, e);
            }
        }

        self.fetch_content()
            .await
            .map(|bytes| FileStat {
                size: bytes.len() as u64,
            })
            .ok_or(StreamError::FetchFailure)
    }

    /// Discard the content and reset the cursor
    ///
    /// The handle cannot be reopened afterwards.
    pub fn close(&mut self) {
        self.content = Content::Unfetched;
        self.cursor = 0;
        self.mode = None;
        self.closed = true;
    }

    /// Remote assets are immutable from this side
    pub fn write(&mut self, _data: &[u8]) -> Result<usize, StreamError> {
        Err(StreamError::UnsupportedOperation("write"))
    }

    pub fn readdir(&mut self) -> Result<String, StreamError> {
        Err(StreamError::UnsupportedOperation("readdir"))
    }

    pub fn rewinddir(&mut self) -> Result<(), StreamError> {
        Err(StreamError::UnsupportedOperation("rewinddir"))
    }

    pub fn closedir(&mut self) -> Result<(), StreamError> {
        Err(StreamError::UnsupportedOperation("closedir"))
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn mode(&self) -> Option<OpenMode> {
        self.mode
    }

    /// Remote URL the handle's URI translates to
    pub fn remote_url(&self) -> Option<String> {
        self.uri
            .as_deref()
            .and_then(|uri| self.translator.translate(uri).ok())
    }

    /// Length of the fetched content, if any
    pub fn content_len(&self) -> Option<usize> {
        match &self.content {
            Content::Loaded(bytes) => Some(bytes.len()),
            Content::Unfetched | Content::Absent => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl std::fmt::Debug for RemoteFileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFileStream")
            .field("uri", &self.uri)
            .field("mode", &self.mode)
            .field("content_len", &self.content_len())
            .field("cursor", &self.cursor)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Read for RemoteFileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.take(buf.len()) {
            Ok(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            Err(StreamError::EndOfData) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl Seek for RemoteFileStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.loaded()?.len() as i128;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.cursor as i128 + delta as i128,
            SeekFrom::End(delta) => len + delta as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            ));
        }
        self.seek_to(target as u64)?;
        Ok(self.cursor as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Method, MockHttpClient};

    const URI: &str = "dam://images/photo.jpg";
    const URL: &str = "http://host/files/images/photo.jpg";
    const BODY: &[u8] = b"0123456789abcdef";

    fn translator() -> Arc<UrlTranslator> {
        Arc::new(
            UrlTranslator::new("dam", "http://host/files/")
                .with_derivative("stylebucket", "http://host/public/"),
        )
    }

    fn stream_with(client: MockHttpClient) -> (Arc<MockHttpClient>, RemoteFileStream) {
        let client = Arc::new(client);
        let stream = RemoteFileStream::new(client.clone(), translator());
        (client, stream)
    }

    async fn opened() -> (Arc<MockHttpClient>, RemoteFileStream) {
        let (client, mut stream) = stream_with(MockHttpClient::new().with_get(URL, 200, BODY));
        stream.open(URI, "r").await.unwrap();
        (client, stream)
    }

    #[test]
    fn test_open_mode_parse() {
        assert_eq!(OpenMode::parse("r"), Ok(OpenMode::Read));
        assert_eq!(OpenMode::parse("rb"), Ok(OpenMode::Read));
        assert_eq!(OpenMode::parse("rt"), Ok(OpenMode::Read));
        for mode in ["w", "wb", "a", "x", "c", "r+", "w+", ""] {
            assert_eq!(
                OpenMode::parse(mode),
                Err(StreamError::InvalidMode(mode.to_string()))
            );
        }
    }

    #[tokio::test]
    async fn test_read_until_eof_returns_full_content() {
        let (_, mut stream) = opened().await;

        let mut collected = Vec::new();
        while !stream.eof() {
            collected.extend_from_slice(&stream.read(5).unwrap());
        }

        assert_eq!(collected, BODY);
        assert_eq!(stream.read(5), Err(StreamError::EndOfData));
    }

    #[tokio::test]
    async fn test_read_is_bounded_by_remaining() {
        let (_, mut stream) = opened().await;
        stream.seek(10, Whence::Start).unwrap();

        let chunk = stream.read(100).unwrap();
        assert_eq!(&chunk[..], b"abcdef");
        assert_eq!(stream.tell(), BODY.len() as u64);
        assert!(stream.eof());
    }

    #[tokio::test]
    async fn test_content_fetched_once() {
        let (client, mut stream) = opened().await;

        stream.read(4).unwrap();
        stream.seek(0, Whence::Start).unwrap();
        stream.fetch_content().await.unwrap();
        stream.read(4).unwrap();

        assert_eq!(client.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_seek_boundary() {
        let (_, mut stream) = opened().await;
        let len = BODY.len() as u64;

        stream.seek(3, Whence::Start).unwrap();
        assert_eq!(
            stream.seek(len + 1, Whence::Start),
            Err(StreamError::OutOfRange {
                offset: len + 1,
                len
            })
        );
        assert_eq!(stream.tell(), 3);

        stream.seek(len, Whence::Start).unwrap();
        assert_eq!(stream.tell(), len);
        assert!(stream.eof());

        stream.seek(0, Whence::Start).unwrap();
        assert_eq!(stream.tell(), 0);
    }

    #[tokio::test]
    async fn test_seek_relative_is_unsupported() {
        let (_, mut stream) = opened().await;
        stream.seek(2, Whence::Start).unwrap();

        assert!(matches!(
            stream.seek(1, Whence::Current),
            Err(StreamError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            stream.seek(0, Whence::End),
            Err(StreamError::UnsupportedOperation(_))
        ));
        assert_eq!(stream.tell(), 2);
    }

    #[tokio::test]
    async fn test_open_write_mode_makes_no_request() {
        let (client, mut stream) = stream_with(MockHttpClient::new().with_get(URL, 200, BODY));

        for mode in ["w", "a", "r+"] {
            assert_eq!(
                stream.open(URI, mode).await,
                Err(StreamError::InvalidMode(mode.to_string()))
            );
        }

        assert_eq!(client.total_calls(), 0);
        assert_eq!(stream.uri(), None);
        assert_eq!(stream.mode(), None);

        // The rejected attempts established no state
        stream.open(URI, "rb").await.unwrap();
        assert_eq!(stream.mode(), Some(OpenMode::Read));
    }

    #[tokio::test]
    async fn test_open_fails_on_missing_resource() {
        let (client, mut stream) = stream_with(MockHttpClient::new());

        assert_eq!(stream.open(URI, "r").await, Err(StreamError::FetchFailure));
        assert_eq!(stream.read(10), Err(StreamError::FetchFailure));
        assert!(matches!(stream.stat().await, Err(StreamError::FetchFailure)));

        // A failed fetch is final: no refetch and no HEAD request
        assert_eq!(client.count(Method::Head), 0);
        assert_eq!(client.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_open_fails_on_empty_body() {
        let (_, mut stream) = stream_with(MockHttpClient::new().with_get(URL, 200, ""));
        assert_eq!(stream.open(URI, "r").await, Err(StreamError::FetchFailure));
        assert_eq!(stream.content_len(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_is_memoized() {
        let (client, mut stream) =
            stream_with(MockHttpClient::new().with_transport_error(Method::Get, URL));

        assert_eq!(stream.open(URI, "r").await, Err(StreamError::FetchFailure));
        assert_eq!(stream.fetch_content().await, None);
        assert_eq!(stream.fetch_content().await, None);

        assert_eq!(client.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_open_rejects_foreign_scheme() {
        let (client, mut stream) = stream_with(MockHttpClient::new());
        assert!(matches!(
            stream.open("public://a.txt", "r").await,
            Err(StreamError::InvalidUri(_))
        ));
        assert_eq!(client.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_derivative_uri_fetches_public_url() {
        let derivative_url = "http://host/public/thumb/photo.jpg";
        let (client, mut stream) =
            stream_with(MockHttpClient::new().with_get(derivative_url, 200, "thumb"));

        stream
            .open("dam://stylebucket/thumb/photo.jpg", "r")
            .await
            .unwrap();

        assert_eq!(stream.remote_url().as_deref(), Some(derivative_url));
        assert_eq!(client.calls()[0].url, derivative_url);
    }

    #[tokio::test]
    async fn test_stat_uses_content_length_from_head() {
        let client = MockHttpClient::new().with_head(URL, 200, Some(1234));
        let client = Arc::new(client);
        let mut stream = RemoteFileStream::bound(client.clone(), translator(), URI);

        assert_eq!(stream.stat().await, Ok(FileStat { size: 1234 }));
        assert_eq!(client.count(Method::Head), 1);
        assert_eq!(client.count(Method::Get), 0);
    }

    #[tokio::test]
    async fn test_stat_falls_back_to_single_get() {
        let client = MockHttpClient::new()
            .with_head(URL, 200, None)
            .with_get(URL, 200, BODY);
        let client = Arc::new(client);
        let mut stream = RemoteFileStream::bound(client.clone(), translator(), URI);

        let stat = stream.stat().await.unwrap();
        assert_eq!(stat.size, BODY.len() as u64);
        assert_eq!(client.count(Method::Get), 1);

        // A second stat reuses the fetched body
        stream.stat().await.unwrap();
        assert_eq!(client.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_stat_fails_after_failed_fetch_even_if_head_has_length() {
        let client = MockHttpClient::new()
            .with_get(URL, 500, "boom")
            .with_head(URL, 200, Some(42));
        let (client, mut stream) = stream_with(client);

        assert_eq!(stream.open(URI, "r").await, Err(StreamError::FetchFailure));
        assert_eq!(stream.read(10), Err(StreamError::FetchFailure));
        assert_eq!(stream.stat().await, Err(StreamError::FetchFailure));
        assert_eq!(stream.content_len(), None);
        assert!(stream.eof());

        assert_eq!(client.count(Method::Head), 0);
        assert_eq!(client.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_stat_fails_when_head_and_get_fail() {
        let client = MockHttpClient::new().with_transport_error(Method::Head, URL);
        let client = Arc::new(client);
        let mut stream = RemoteFileStream::bound(client.clone(), translator(), URI);

        assert_eq!(stream.stat().await, Err(StreamError::FetchFailure));
        assert_eq!(client.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_write_never_mutates() {
        let (_, mut stream) = opened().await;
        stream.read(4).unwrap();

        assert_eq!(
            stream.write(b"data"),
            Err(StreamError::UnsupportedOperation("write"))
        );
        assert_eq!(stream.tell(), 4);
        assert_eq!(stream.content_len(), Some(BODY.len()));
    }

    #[tokio::test]
    async fn test_directory_operations_unsupported() {
        let (_, mut stream) = opened().await;
        assert!(stream.readdir().is_err());
        assert!(stream.rewinddir().is_err());
        assert!(stream.closedir().is_err());
    }

    #[tokio::test]
    async fn test_close_discards_content() {
        let (client, mut stream) = opened().await;
        stream.read(4).unwrap();

        stream.close();

        assert!(stream.is_closed());
        assert_eq!(stream.tell(), 0);
        assert_eq!(stream.content_len(), None);
        assert_eq!(stream.read(1), Err(StreamError::HandleClosed));
        assert_eq!(stream.fetch_content().await, None);
        assert_eq!(
            stream.open(URI, "r").await,
            Err(StreamError::HandleClosed)
        );
        assert_eq!(client.count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_open_twice_is_rejected() {
        let (_, mut stream) = opened().await;
        assert_eq!(
            stream.open("dam://images/other.jpg", "r").await,
            Err(StreamError::HandleClosed)
        );
        assert_eq!(stream.uri(), Some(URI));
    }

    #[tokio::test]
    async fn test_io_read_and_seek() {
        let (_, mut stream) = opened().await;

        let mut buf = String::new();
        Read::read_to_string(&mut stream, &mut buf).unwrap();
        assert_eq!(buf.as_bytes(), BODY);

        assert_eq!(Seek::seek(&mut stream, SeekFrom::End(-6)).unwrap(), 10);
        assert_eq!(Seek::seek(&mut stream, SeekFrom::Current(-2)).unwrap(), 8);

        let mut two = [0u8; 2];
        Read::read_exact(&mut stream, &mut two).unwrap();
        assert_eq!(&two, b"89");

        let err = Seek::seek(&mut stream, SeekFrom::End(1)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(stream.tell(), 10);

        let err = Seek::seek(&mut stream, SeekFrom::Current(-100)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}

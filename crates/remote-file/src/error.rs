//! Error type reported by remote file handles

/// Failure reported by a [`RemoteFileStream`](crate::RemoteFileStream) or
/// [`RemoteFs`](crate::RemoteFs) operation.
///
/// Remote failures carry no structured detail: a 404, a 500 and an
/// unreachable host all surface as [`StreamError::FetchFailure`]. The cause is
/// logged where it happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Write, directory, rename, mkdir and rmdir calls
    #[error("Operation not supported by remote file streams: {0}")]
    UnsupportedOperation(&'static str),

    /// The remote resource could not be fetched or was empty
    #[error("Remote content is not available")]
    FetchFailure,

    /// Seek target lies beyond the fetched content
    #[error("Offset {offset} is out of range for content of {len} bytes")]
    OutOfRange { offset: u64, len: u64 },

    /// Open was requested with a mode other than read
    #[error("Invalid open mode '{0}': remote files are read-only")]
    InvalidMode(String),

    /// The cursor already sits at the end of the content
    #[error("End of data")]
    EndOfData,

    /// The URI is not addressed to this scheme
    #[error("URI '{0}' does not match any rewrite rule")]
    InvalidUri(String),

    /// The handle has been closed or is already bound to a URI
    #[error("Handle is closed or already in use")]
    HandleClosed,
}

impl From<StreamError> for std::io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match err {
            StreamError::UnsupportedOperation(_) => std::io::ErrorKind::Unsupported,
            StreamError::FetchFailure => std::io::ErrorKind::NotFound,
            StreamError::OutOfRange { .. } | StreamError::InvalidMode(_) => {
                std::io::ErrorKind::InvalidInput
            }
            StreamError::EndOfData => std::io::ErrorKind::UnexpectedEof,
            StreamError::InvalidUri(_) => std::io::ErrorKind::InvalidInput,
            StreamError::HandleClosed => std::io::ErrorKind::NotConnected,
        };
        std::io::Error::new(kind, err)
    }
}

//! Read-only virtual file handles over assets held by a remote DAM service
//!
//! A URI such as `dam://images/photo.jpg` is translated into the HTTP URL that
//! serves the asset, fetched once, and exposed as a byte stream with
//! read/seek/tell/eof/stat operations over the buffered body.
//!
//! # Components
//!
//! - [`UrlTranslator`]: ordered literal rewrite rules from URI to URL
//! - [`HttpClient`]: the HTTP capability (GET, HEAD, POST), with
//!   [`ReqwestClient`] as the production implementation
//! - [`RemoteFileStream`]: one open handle
//! - [`RemoteFs`]: the scheme handler that creates handles and answers
//!   path-level calls (stat, unlink, rename, directories)
//!
//! Writes and directories are not supported.
//!
//! # Example
//!
//! ```ignore
//! use dam_remote_file::{RemoteFs, ReqwestClient, UrlTranslator, DEFAULT_READ_CHUNK};
//! use std::sync::Arc;
//!
//! let translator = UrlTranslator::new("dam", "https://dam.example.com/files/")
//!     .with_derivative("styles", "https://dam.example.com/public/");
//! let fs = RemoteFs::new(Arc::new(ReqwestClient::new()), translator);
//!
//! let mut stream = fs.open("dam://images/photo.jpg", "r").await?;
//! while !stream.eof() {
//!     let chunk = stream.read(DEFAULT_READ_CHUNK)?;
//!     // Process chunk...
//! }
//! stream.close();
//! ```

mod error;
mod http;
mod stream;
pub mod testing;
mod translate;
mod wrapper;

pub use error::StreamError;
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use stream::{FileStat, OpenMode, RemoteFileStream, Whence};
pub use translate::{RewriteRule, UrlTranslator};
pub use wrapper::RemoteFs;

/// Default chunk size for sequential reads (8KB)
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

//! dam-stream
//!
//! Read assets held by a Digital Asset Management service through a virtual
//! URI scheme (`dam://images/photo.jpg`), and forward locally stored files to
//! the DAM so their records point at the remote copy.
//!
//! # Crates
//!
//! - `dam_remote_file` - read-only remote file handles and the scheme handler
//! - `dam_upload` - the upload collaborator
//!
//! # CLI Usage
//!
//! ```bash
//! # Print an asset
//! dam-stream --base-url https://dam.example.com/files/ cat dam://images/photo.jpg
//!
//! # Size of an asset
//! dam-stream --config dam.toml stat dam://styles/thumb/photo.jpg
//!
//! # Upload a local file and print its new URI
//! dam-stream --config dam.toml upload ./report.pdf
//! ```

pub mod config;

// Re-export the workspace crates for convenience
pub use dam_remote_file as remote;
pub use dam_upload as upload;

pub use config::{DamConfig, DamOpts};

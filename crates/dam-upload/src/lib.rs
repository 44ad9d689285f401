//! Upload collaborator for the DAM service
//!
//! After the host saves a file locally, [`DamUploader`] posts it to the DAM
//! upload endpoint as `{"entity":{"filename":...},"content":<base64>}`. On a
//! 200 answer the body holds the path the DAM assigned, and the host record
//! is pointed at `scheme://<path>` so later reads go through
//! `dam_remote_file::RemoteFs`.
//!
//! Records stay untouched on any failure. There is no retry and no rollback
//! of the local save.

mod payload;
mod record;
mod uploader;

pub use payload::{parse_remote_path, UploadEntity, UploadPayload};
pub use record::{FileRecord, LocalFileRecord, MemoryFileRecord};
pub use uploader::{DamUploader, UploadError};

//! Forward file records to the DAM upload endpoint

use crate::payload::{parse_remote_path, UploadPayload};
use crate::record::FileRecord;
use dam_remote_file::{HttpClient, UrlTranslator};
use std::sync::Arc;

/// Failure while uploading a record
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The record's bytes could not be read
    #[error("Failed to read '{filename}': {cause:#}")]
    Read {
        filename: String,
        cause: anyhow::Error,
    },

    /// The payload could not be serialized
    #[error("Failed to encode upload payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// The endpoint was unreachable
    #[error("Upload request failed: {0:#}")]
    Transport(anyhow::Error),

    /// The endpoint answered something other than 200
    #[error("Upload rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The endpoint accepted the file but returned no path
    #[error("Upload response did not contain a remote path")]
    EmptyPath,

    /// The record could not be pointed at its remote copy
    #[error("Failed to update record location to '{uri}': {cause:#}")]
    Relocate { uri: String, cause: anyhow::Error },
}

/// Sends files to the DAM service and relocates their records
///
/// A record is relocated only after the endpoint answers 200 with a path.
/// Failures leave the record exactly as it was; nothing is retried, so a
/// file saved locally may never reach the DAM service.
#[derive(Clone)]
pub struct DamUploader {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    translator: Arc<UrlTranslator>,
}

impl DamUploader {
    pub fn new(
        client: Arc<dyn HttpClient>,
        endpoint: impl Into<String>,
        translator: Arc<UrlTranslator>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            translator,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the upload payload for a record
    pub async fn payload_for(&self, record: &dyn FileRecord) -> Result<UploadPayload, UploadError> {
        let bytes = record
            .read_bytes()
            .await
            .map_err(|cause| UploadError::Read {
                filename: record.filename().to_string(),
                cause,
            })?;
        Ok(UploadPayload::new(record.filename(), &bytes))
    }

    /// Upload `record` and point it at the remote copy
    ///
    /// Returns the record's new URI.
    pub async fn upload(&self, record: &mut dyn FileRecord) -> Result<String, UploadError> {
        let payload = self.payload_for(record).await?;
        let body = payload.to_json()?;

        tracing::debug!(
            "Uploading {} ({} base64 bytes) to {}",
            record.filename(),
            payload.content.len(),
            self.endpoint
        );

        let response = self
            .client
            .post_json(&self.endpoint, &body)
            .await
            .map_err(|e| {
                tracing::error!("Upload of {} failed: {:#}", record.filename(), e);
                UploadError::Transport(e)
            })?;

        if response.status != 200 {
            let message = response.body_text();
            tracing::error!(
                "Upload of {} rejected: HTTP {} {}",
                record.filename(),
                response.status,
                message
            );
            return Err(UploadError::Rejected {
                status: response.status,
                message,
            });
        }

        let remote_path = parse_remote_path(&response.body).ok_or_else(|| {
            tracing::error!("Upload of {} returned no remote path", record.filename());
            UploadError::EmptyPath
        })?;

        let uri = self.translator.uri_for(&remote_path);
        record
            .set_location(&uri)
            .await
            .map_err(|cause| UploadError::Relocate {
                uri: uri.clone(),
                cause,
            })?;

        tracing::info!("Uploaded {} to {}", record.filename(), uri);
        Ok(uri)
    }
}

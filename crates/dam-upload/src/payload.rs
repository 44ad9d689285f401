//! JSON body accepted by the DAM upload endpoint

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// Metadata describing the uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadEntity {
    pub filename: String,
}

/// Upload request: `{"entity":{"filename":...},"content":<base64>}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub entity: UploadEntity,
    /// File bytes, standard base64 with padding
    pub content: String,
}

impl UploadPayload {
    pub fn new(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            entity: UploadEntity {
                filename: filename.into(),
            },
            content: BASE64.encode(bytes),
        }
    }

    /// Decode the base64 content back into bytes
    pub fn decode_content(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.content)
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Extract the assigned remote path from a successful upload response
///
/// The endpoint answers either a JSON string (`"/images/a.txt"`) or the bare
/// path. Whitespace and leading slashes are dropped. Returns `None` when no
/// path remains.
pub fn parse_remote_path(body: &[u8]) -> Option<String> {
    let path = match serde_json::from_slice::<String>(body) {
        Ok(path) => path,
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    };
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

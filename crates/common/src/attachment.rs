//! Binary step attachments, embedded as base64 in the result record

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// An attachment in Cucumber JSON `embeddings` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embedding {
    pub mime_type: String,

    /// Base64 of the raw attachment bytes
    pub data: String,
}

impl Embedding {
    pub fn encode(mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(data),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD.decode(&self.data).map_err(|e| {
            warn!("Undecodable {} attachment: {}", self.mime_type, e);
            Error::Decode(format!("invalid base64 attachment: {}", e))
        })
    }
}

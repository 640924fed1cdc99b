//! Binary payloads exchanged with vision and speech providers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{FitgenError, Result};

/// An image to be analysed.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decode a base64 payload, accepting an optional `data:<mime>;base64,` prefix.
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> Result<Self> {
        let mut mime_type = mime_type.into();
        let mut payload = encoded.trim();
        if let Some(rest) = payload.strip_prefix("data:") {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| FitgenError::InvalidInput("malformed data URL".into()))?;
            if let Some(m) = header.strip_suffix(";base64") {
                if !m.is_empty() {
                    mime_type = m.to_string();
                }
            }
            payload = body;
        }
        if !mime_type.starts_with("image/") {
            return Err(FitgenError::InvalidInput(format!(
                "expected an image MIME type, got '{mime_type}'"
            )));
        }
        let data = STANDARD
            .decode(payload)
            .map_err(|e| FitgenError::InvalidInput(format!("invalid base64 image: {e}")))?;
        if data.is_empty() {
            return Err(FitgenError::InvalidInput("image is empty".into()));
        }
        Ok(Self { mime_type, data })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

/// Synthesised speech.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub content_type: String,
    /// Model that produced the clip.
    pub model: String,
}

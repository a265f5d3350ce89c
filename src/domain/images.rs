use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ids::{ImageId, ProjectId};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_PARAMETER: &str = "base64";

/// A self-describing `data:<mime>;base64,<payload>` image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    mime_type: String,
    data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InlineImageError {
    #[error("image entry is blank")]
    Blank,
    #[error("missing `data:` prefix")]
    MissingPrefix,
    #[error("missing `;base64,` marker")]
    MissingBase64Marker,
    #[error("missing mime type")]
    MissingMimeType,
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("payload decodes to zero bytes")]
    EmptyPayload,
}

impl InlineImageError {
    /// Blank entries and empty payloads are missing input rather than malformed input.
    pub fn is_missing_content(&self) -> bool {
        matches!(self, Self::Blank | Self::EmptyPayload)
    }
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl FromStr for InlineImage {
    type Err = InlineImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InlineImageError::Blank);
        }

        let rest = s
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or(InlineImageError::MissingPrefix)?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or(InlineImageError::MissingBase64Marker)?;
        let (mime_type, parameters) = header
            .split_once(';')
            .ok_or(InlineImageError::MissingBase64Marker)?;

        if !parameters
            .split(';')
            .any(|p| p.trim().eq_ignore_ascii_case(BASE64_PARAMETER))
        {
            return Err(InlineImageError::MissingBase64Marker);
        }

        let mime_type = mime_type.trim();
        if mime_type.is_empty() {
            return Err(InlineImageError::MissingMimeType);
        }

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|err| InlineImageError::InvalidBase64(err.to_string()))?;
        if data.is_empty() {
            return Err(InlineImageError::EmptyPayload);
        }

        Ok(Self {
            mime_type: mime_type.to_ascii_lowercase(),
            data,
        })
    }
}

impl fmt::Display for InlineImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{DATA_URL_PREFIX}{};{BASE64_PARAMETER},{}",
            self.mime_type,
            STANDARD.encode(&self.data)
        )
    }
}

/// A persisted gallery image. `project_id` is a plain foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectImage {
    pub id: ImageId,
    pub project_id: ProjectId,
    pub mime_type: String,
    pub image_data: Vec<u8>,
    pub is_cover: bool,
    pub created_at: DateTime<Utc>,
}

impl ProjectImage {
    pub fn to_inline(&self) -> InlineImage {
        InlineImage::new(self.mime_type.clone(), self.image_data.clone())
    }
}

/// A normalized image waiting to be persisted. New images are never covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProjectImage {
    pub mime_type: String,
    pub image_data: Vec<u8>,
}

/// Gallery entry as handed to display callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: ImageId,
    pub mime_type: String,
    pub data_url: String,
    pub is_cover: bool,
}

impl From<&ProjectImage> for ImageResponse {
    fn from(image: &ProjectImage) -> Self {
        Self {
            id: image.id,
            mime_type: image.mime_type.clone(),
            data_url: image.to_inline().to_string(),
            is_cover: image.is_cover,
        }
    }
}

/// Lightweight listing row without the image payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: ImageId,
    pub mime_type: String,
    pub size_bytes: usize,
    pub is_cover: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ProjectImage> for ImageSummary {
    fn from(image: &ProjectImage) -> Self {
        Self {
            id: image.id,
            mime_type: image.mime_type.clone(),
            size_bytes: image.image_data.len(),
            is_cover: image.is_cover,
            created_at: image.created_at,
        }
    }
}

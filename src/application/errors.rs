use thiserror::Error;

use crate::domain::RepositoryError;
use crate::domain::images::InlineImageError;
use crate::infrastructure::image_processing::ImageProcessingError;

/// Failure of one gallery operation. Every operation reports through this
/// type; nothing is swallowed into a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid image format: {0}")]
    InvalidFormat(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ImageError {
    /// Map a repository failure, describing a missing record with `not_found`.
    pub(crate) fn from_repository(err: RepositoryError, not_found: impl FnOnce() -> String) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(not_found()),
            other => Self::from(other),
        }
    }

    pub(crate) fn from_inline(index: usize, err: InlineImageError) -> Self {
        let message = format!("image #{index}: {err}");
        if err.is_missing_content() {
            Self::InvalidInput(message)
        } else {
            Self::InvalidFormat(message)
        }
    }

    /// Undecodable bytes are the caller's fault; a failed encode is ours.
    pub(crate) fn from_processing(index: usize, err: ImageProcessingError) -> Self {
        let message = format!("image #{index}: {err}");
        match err {
            ImageProcessingError::Decode(_) => Self::InvalidFormat(message),
            ImageProcessingError::Encode(_) => Self::Internal(message),
        }
    }
}

impl From<RepositoryError> for ImageError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound(err.to_string()),
            RepositoryError::Conflict(message) | RepositoryError::Unexpected(message) => {
                Self::Persistence(message)
            }
        }
    }
}

//! Error types shared across ports, adapters and services.

use thiserror::Error;

/// Failures of the persistence ports (video and user repositories).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0} already exists")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn video_not_found(id: &str) -> Self {
        RepositoryError::NotFound {
            entity: "Video",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: &str) -> Self {
        RepositoryError::NotFound {
            entity: "User",
            id: id.to_string(),
        }
    }
}

/// Failures of the external AI collaborator.
///
/// A transcription failure is fatal to a job; a question generation failure
/// only affects the segment it was requested for.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Question generation failed: {0}")]
    QuestionGenerationFailed(String),
}

/// Failures of the media storage port.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name: {0}")]
    InvalidPath(String),

    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures inside one pipeline run. Never returned to the launcher; a run
/// records them on the job as the `error` state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("media unavailable: {0}")]
    MediaUnavailable(#[from] StorageError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("processing aborted: {0}")]
    Aborted(String),
}

/// Failures of registration, login and token verification.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Email already in use")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Failures while accepting an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only {allowed} files are allowed")]
    UnsupportedType { allowed: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

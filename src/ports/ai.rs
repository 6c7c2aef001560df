use crate::domain::quiz::GeneratedQuestion;
use crate::domain::transcription::TranscriptionResult;
use crate::error::AiError;
use crate::ports::storage::MediaHandle;
use async_trait::async_trait;

/// Speech-to-text for a stored media file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Transcribe the whole file. Any non-success outcome is `TranscriptionFailed`;
    /// partial results are never returned.
    async fn transcribe(&self, media: &MediaHandle) -> Result<TranscriptionResult, AiError>;
}

/// Multiple-choice question synthesis for one segment of text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerationPort: Send + Sync {
    /// `ordinal` is 1-based, `total` is the number of segments in the job.
    async fn generate_questions(
        &self,
        text: &str,
        ordinal: usize,
        total: usize,
    ) -> Result<Vec<GeneratedQuestion>, AiError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiHealthPort: Send + Sync {
    /// Whether the AI collaborator answers its health endpoint
    async fn health_check(&self) -> bool;
}

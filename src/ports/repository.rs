use crate::domain::jobs::{Segment, StatusUpdate, Video, VideoQuery};
use crate::domain::users::User;
use crate::error::RepositoryError;
use async_trait::async_trait;

/// Persisted job state. Each operation is independent; no transaction spans calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Create a new video record
    async fn insert_video(&self, video: &Video) -> Result<(), RepositoryError>;

    /// Load a video, `NotFound` if the id is unknown
    async fn find_video(&self, video_id: &str) -> Result<Video, RepositoryError>;

    /// Overwrite status, progress and current step (and the error message when given).
    /// No other field is touched.
    async fn update_status(
        &self,
        video_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), RepositoryError>;

    /// Store the transcript and the complete segment list in one write
    async fn save_results(
        &self,
        video_id: &str,
        transcript: &str,
        segments: &[Segment],
    ) -> Result<(), RepositoryError>;

    /// Videos matching the owner filter, newest upload first
    async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user, `Conflict` if the email is already registered
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError>;

    async fn find_user(&self, user_id: &str) -> Result<User, RepositoryError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Record ownership of a video
    async fn append_video(&self, user_id: &str, video_id: &str) -> Result<(), RepositoryError>;
}

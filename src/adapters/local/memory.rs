//! In-process store used when no Redis URL is configured. State is lost on restart.

use crate::domain::jobs::{Segment, StatusUpdate, Video, VideoQuery};
use crate::domain::users::User;
use crate::error::RepositoryError;
use crate::ports::repository::{UserRepository, VideoRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    videos: HashMap<String, Video>,
    users: HashMap<String, User>,
    /// normalized email -> user id
    emails: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for MemoryStore {
    async fn insert_video(&self, video: &Video) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.videos.contains_key(&video.id) {
            return Err(RepositoryError::Conflict(format!("Video {}", video.id)));
        }
        state.videos.insert(video.id.clone(), video.clone());
        Ok(())
    }

    async fn find_video(&self, video_id: &str) -> Result<Video, RepositoryError> {
        self.state
            .read()
            .await
            .videos
            .get(video_id)
            .cloned()
            .ok_or_else(|| RepositoryError::video_not_found(video_id))
    }

    async fn update_status(
        &self,
        video_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let video = state
            .videos
            .get_mut(video_id)
            .ok_or_else(|| RepositoryError::video_not_found(video_id))?;
        video.status = update.status;
        video.progress = update.progress;
        video.current_step = update.current_step.clone();
        if let Some(message) = &update.error_message {
            video.error_message = Some(message.clone());
        }
        Ok(())
    }

    async fn save_results(
        &self,
        video_id: &str,
        transcript: &str,
        segments: &[Segment],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let video = state
            .videos
            .get_mut(video_id)
            .ok_or_else(|| RepositoryError::video_not_found(video_id))?;
        video.transcript = Some(transcript.to_string());
        video.segments = segments.to_vec();
        Ok(())
    }

    async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>, RepositoryError> {
        let state = self.state.read().await;
        let mut videos: Vec<Video> = state
            .videos
            .values()
            .filter(|v| v.owner == query.owner)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        videos.truncate(query.limit);
        Ok(videos)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.emails.contains_key(&user.email) {
            return Err(RepositoryError::Conflict(format!("User {}", user.email)));
        }
        state.emails.insert(user.email.clone(), user.id.clone());
        state.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<User, RepositoryError> {
        self.state
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::user_not_found(user_id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .emails
            .get(email)
            .and_then(|id| state.users.get(id))
            .cloned())
    }

    async fn append_video(&self, user_id: &str, video_id: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| RepositoryError::user_not_found(user_id))?;
        user.videos.push(video_id.to_string());
        Ok(())
    }
}

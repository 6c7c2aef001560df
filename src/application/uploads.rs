use crate::application::launcher::PipelineLauncher;
use crate::domain::jobs::{NewVideo, Video};
use crate::domain::users::Principal;
use crate::error::UploadError;
use crate::ports::media::MediaProbe;
use crate::ports::repository::{UserRepository, VideoRepository};
use crate::ports::storage::{ByteStream, MediaStorage};
use std::sync::Arc;
use tracing::{info, warn};

/// Turns an incoming upload into a job and starts processing it.
#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn MediaStorage>,
    probe: Arc<dyn MediaProbe>,
    videos: Arc<dyn VideoRepository>,
    users: Arc<dyn UserRepository>,
    launcher: PipelineLauncher,
    allowed_mime_types: Vec<String>,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        probe: Arc<dyn MediaProbe>,
        videos: Arc<dyn VideoRepository>,
        users: Arc<dyn UserRepository>,
        launcher: PipelineLauncher,
        allowed_mime_types: Vec<String>,
    ) -> Self {
        Self {
            storage,
            probe,
            videos,
            users,
            launcher,
            allowed_mime_types,
        }
    }

    pub fn accepts(&self, mimetype: &str) -> bool {
        let mimetype = mimetype.trim().to_ascii_lowercase();
        self.allowed_mime_types.iter().any(|allowed| *allowed == mimetype)
    }

    /// Stores the body, records the job (status `uploaded`) and launches the
    /// pipeline without waiting for it.
    pub async fn accept<'a>(
        &self,
        original_name: &str,
        mimetype: &str,
        body: ByteStream<'a>,
        owner: Option<&Principal>,
    ) -> Result<Video, UploadError> {
        if !self.accepts(mimetype) {
            return Err(UploadError::UnsupportedType {
                allowed: self.allowed_mime_types.join(", "),
            });
        }

        let stored = self.storage.store(original_name, body).await?;
        let duration = self.probe.duration(&stored.path).await;

        let video = Video::from_upload(NewVideo {
            filename: stored.filename,
            original_name: original_name.to_string(),
            mimetype: mimetype.to_string(),
            size: stored.size,
            duration,
            owner: owner.map(|p| p.user_id.clone()),
        });
        if let Err(e) = self.videos.insert_video(&video).await {
            if let Err(cleanup) = self.storage.remove(&video.filename).await {
                warn!(filename = %video.filename, "Failed to remove orphaned upload: {}", cleanup);
            }
            return Err(e.into());
        }

        if let Some(principal) = owner {
            if let Err(e) = self.users.append_video(&principal.user_id, &video.id).await {
                warn!(video_id = %video.id, user_id = %principal.user_id, "Failed to record ownership: {}", e);
            }
        }

        info!(video_id = %video.id, size = video.size, "Upload stored");
        // The request path never joins the run.
        drop(self.launcher.launch(&video.id));
        Ok(video)
    }
}

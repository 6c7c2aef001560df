//! Redis VideoRepository and UserRepository implementations.

use super::pool::RedisPool;
use super::{
    ANONYMOUS_INDEX, EMAIL_INDEX_PREFIX, OWNER_INDEX_PREFIX, USER_PREFIX, USER_VIDEOS_PREFIX,
    VIDEO_PREFIX,
};
use crate::domain::jobs::{Segment, StatusUpdate, Video, VideoQuery, VideoStatus};
use crate::domain::users::User;
use crate::error::RepositoryError;
use crate::ports::repository::{UserRepository, VideoRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::redis::{self, AsyncCommands};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

fn video_key(video_id: &str) -> String {
    format!("{}{}", VIDEO_PREFIX, video_id)
}

fn index_key(owner: Option<&str>) -> String {
    match owner {
        Some(owner) => format!("{}{}", OWNER_INDEX_PREFIX, owner),
        None => ANONYMOUS_INDEX.to_string(),
    }
}

/// Flattens a video into hash fields. Absent optional values are omitted.
fn video_to_fields(video: &Video) -> Result<Vec<(&'static str, String)>, RepositoryError> {
    let mut fields = vec![
        ("id", video.id.clone()),
        ("filename", video.filename.clone()),
        ("originalName", video.original_name.clone()),
        ("mimetype", video.mimetype.clone()),
        ("size", video.size.to_string()),
        ("uploadDate", video.upload_date.to_rfc3339()),
        ("status", video.status.as_str().to_string()),
        ("progress", video.progress.to_string()),
        ("currentStep", video.current_step.clone()),
        ("segments", serde_json::to_string(&video.segments)?),
    ];
    if let Some(duration) = video.duration {
        fields.push(("duration", duration.to_string()));
    }
    if let Some(owner) = &video.owner {
        fields.push(("owner", owner.clone()));
    }
    if let Some(transcript) = &video.transcript {
        fields.push(("transcript", transcript.clone()));
    }
    if let Some(message) = &video.error_message {
        fields.push(("errorMessage", message.clone()));
    }
    Ok(fields)
}

fn video_from_fields(mut fields: HashMap<String, String>) -> Result<Video, RepositoryError> {
    let mut required = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| RepositoryError::Backend(format!("video hash is missing {}", name)))
    };

    let id = required("id")?;
    let filename = required("filename")?;
    let original_name = required("originalName")?;
    let mimetype = required("mimetype")?;
    let size = parse_field("size", &required("size")?)?;
    let upload_date = DateTime::parse_from_rfc3339(&required("uploadDate")?)
        .map_err(|e| RepositoryError::Backend(format!("invalid uploadDate: {}", e)))?
        .with_timezone(&Utc);
    let status = VideoStatus::from_str(&required("status")?).map_err(RepositoryError::Backend)?;
    let progress = parse_field("progress", &required("progress")?)?;
    let current_step = required("currentStep")?;

    let segments: Vec<Segment> = match fields.remove("segments") {
        Some(json) => serde_json::from_str(&json)?,
        None => Vec::new(),
    };
    let duration = match fields.remove("duration") {
        Some(raw) => Some(parse_field("duration", &raw)?),
        None => None,
    };

    Ok(Video {
        id,
        filename,
        original_name,
        mimetype,
        size,
        duration,
        upload_date,
        owner: fields.remove("owner"),
        status,
        progress,
        current_step,
        transcript: fields.remove("transcript"),
        segments,
        error_message: fields.remove("errorMessage"),
    })
}

fn parse_field<T: FromStr>(name: &str, raw: &str) -> Result<T, RepositoryError> {
    raw.parse()
        .map_err(|_| RepositoryError::Backend(format!("invalid {} value {:?}", name, raw)))
}

impl RedisPool {
    /// HSET on a missing key would create a partial hash.
    async fn ensure_video_exists(
        &self,
        conn: &mut deadpool_redis::Connection,
        video_id: &str,
    ) -> Result<(), RepositoryError> {
        let exists: bool = conn.exists(video_key(video_id)).await?;
        if exists {
            Ok(())
        } else {
            Err(RepositoryError::video_not_found(video_id))
        }
    }
}

#[async_trait]
impl VideoRepository for RedisPool {
    async fn insert_video(&self, video: &Video) -> Result<(), RepositoryError> {
        let mut conn = self.connection().await?;
        let fields = video_to_fields(video)?;
        redis::pipe()
            .atomic()
            .hset_multiple(video_key(&video.id), &fields[..])
            .ignore()
            .zadd(
                index_key(video.owner.as_deref()),
                &video.id,
                video.upload_date.timestamp_millis(),
            )
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn find_video(&self, video_id: &str) -> Result<Video, RepositoryError> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(video_key(video_id)).await?;
        if fields.is_empty() {
            return Err(RepositoryError::video_not_found(video_id));
        }
        video_from_fields(fields)
    }

    async fn update_status(
        &self,
        video_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.connection().await?;
        self.ensure_video_exists(&mut conn, video_id).await?;

        let mut fields = vec![
            ("status", update.status.as_str().to_string()),
            ("progress", update.progress.to_string()),
            ("currentStep", update.current_step.clone()),
        ];
        if let Some(message) = &update.error_message {
            fields.push(("errorMessage", message.clone()));
        }
        conn.hset_multiple::<_, _, _, ()>(video_key(video_id), &fields[..])
            .await?;
        Ok(())
    }

    async fn save_results(
        &self,
        video_id: &str,
        transcript: &str,
        segments: &[Segment],
    ) -> Result<(), RepositoryError> {
        let mut conn = self.connection().await?;
        self.ensure_video_exists(&mut conn, video_id).await?;

        let fields = [
            ("transcript", transcript.to_string()),
            ("segments", serde_json::to_string(segments)?),
        ];
        conn.hset_multiple::<_, _, _, ()>(video_key(video_id), &fields[..])
            .await?;
        Ok(())
    }

    async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>, RepositoryError> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;
        let stop = isize::try_from(query.limit).unwrap_or(isize::MAX) - 1;
        let ids: Vec<String> = conn
            .zrevrange(index_key(query.owner.as_deref()), 0, stop)
            .await?;

        let mut videos = Vec::with_capacity(ids.len());
        for id in ids {
            let fields: HashMap<String, String> = conn.hgetall(video_key(&id)).await?;
            if !fields.is_empty() {
                videos.push(video_from_fields(fields)?);
            }
        }
        Ok(videos)
    }
}

/// Writes the user record and its video list in one transaction.
fn user_record_pipeline(user: &User) -> Result<redis::Pipeline, RepositoryError> {
    let record = User {
        videos: Vec::new(),
        ..user.clone()
    };
    let json = serde_json::to_string(&record)?;
    let mut pipe = redis::pipe();
    pipe.atomic()
        .set(format!("{}{}", USER_PREFIX, user.id), json)
        .ignore();
    if !user.videos.is_empty() {
        pipe.rpush(format!("{}{}", USER_VIDEOS_PREFIX, user.id), &user.videos)
            .ignore();
    }
    Ok(pipe)
}

#[async_trait]
impl UserRepository for RedisPool {
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut conn = self.connection().await?;
        let email_key = format!("{}{}", EMAIL_INDEX_PREFIX, user.email);
        let claimed: bool = conn.set_nx(&email_key, &user.id).await?;
        if !claimed {
            return Err(RepositoryError::Conflict(format!("User {}", user.email)));
        }

        let written = match user_record_pipeline(user) {
            Ok(pipe) => pipe.query_async::<_, ()>(&mut conn).await.map_err(RepositoryError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // Release the email so the address can register again.
            if let Err(release) = conn.del::<_, ()>(&email_key).await {
                warn!(user_id = %user.id, "Failed to release email claim: {}", release);
            }
            return Err(e);
        }
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> Result<User, RepositoryError> {
        let mut conn = self.connection().await?;
        let json: Option<String> = conn.get(format!("{}{}", USER_PREFIX, user_id)).await?;
        let mut user: User = match json {
            Some(data) => serde_json::from_str(&data)?,
            None => return Err(RepositoryError::user_not_found(user_id)),
        };
        user.videos = conn
            .lrange(format!("{}{}", USER_VIDEOS_PREFIX, user_id), 0, -1)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.connection().await?;
        let user_id: Option<String> = conn.get(format!("{}{}", EMAIL_INDEX_PREFIX, email)).await?;
        drop(conn);
        match user_id {
            Some(id) => match self.find_user(&id).await {
                Ok(user) => Ok(Some(user)),
                Err(RepositoryError::NotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            },
            None => Ok(None),
        }
    }

    async fn append_video(&self, user_id: &str, video_id: &str) -> Result<(), RepositoryError> {
        let mut conn = self.connection().await?;
        let exists: bool = conn.exists(format!("{}{}", USER_PREFIX, user_id)).await?;
        if !exists {
            return Err(RepositoryError::user_not_found(user_id));
        }
        conn.rpush::<_, _, ()>(format!("{}{}", USER_VIDEOS_PREFIX, user_id), video_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::NewVideo;

    fn sample_video() -> Video {
        let mut video = Video::from_upload(NewVideo {
            filename: "video-1-abc.mp4".to_string(),
            original_name: "Week 1.mp4".to_string(),
            mimetype: "video/mp4".to_string(),
            size: 2048,
            duration: Some(754.25),
            owner: Some("user-1".to_string()),
        });
        video.segments = vec![Segment {
            id: "s1".to_string(),
            start_time: 0,
            end_time: 300,
            text: "Intro".to_string(),
            questions: Vec::new(),
        }];
        video.transcript = Some("Intro".to_string());
        video
    }

    fn into_map(fields: Vec<(&'static str, String)>) -> HashMap<String, String> {
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_video_fields_restore_the_same_video() {
        let video = sample_video();
        let fields = into_map(video_to_fields(&video).unwrap());

        let restored = video_from_fields(fields).unwrap();

        assert_eq!(restored.id, video.id);
        assert_eq!(restored.duration, Some(754.25));
        assert_eq!(restored.owner.as_deref(), Some("user-1"));
        assert_eq!(restored.segments, video.segments);
        assert_eq!(
            restored.upload_date.timestamp_millis(),
            video.upload_date.timestamp_millis()
        );
        assert!(restored.error_message.is_none());
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let mut video = sample_video();
        video.owner = None;
        video.duration = None;
        video.transcript = None;

        let fields = into_map(video_to_fields(&video).unwrap());

        assert!(!fields.contains_key("owner"));
        assert!(!fields.contains_key("duration"));
        assert!(!fields.contains_key("transcript"));
        assert_eq!(fields["status"], "uploaded");
    }

    #[test]
    fn test_missing_required_field_is_backend_error() {
        let mut fields = into_map(video_to_fields(&sample_video()).unwrap());
        fields.remove("status");

        assert!(matches!(
            video_from_fields(fields),
            Err(RepositoryError::Backend(_))
        ));
    }

    #[test]
    fn test_index_keys() {
        assert_eq!(index_key(Some("u1")), "lectern:videos:owner:u1");
        assert_eq!(index_key(None), "lectern:videos:anonymous");
    }

    #[test]
    fn test_user_record_is_written_in_one_transaction() {
        let user = User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            videos: vec!["v1".to_string()],
            created_at: Utc::now(),
        };

        let packed = user_record_pipeline(&user).unwrap().get_packed_pipeline();
        let packed = String::from_utf8_lossy(&packed);

        let multi = packed.find("MULTI").unwrap();
        let set = packed.find("lectern:user:u1").unwrap();
        let rpush = packed.find("lectern:user_videos:u1").unwrap();
        let exec = packed.find("EXEC").unwrap();
        assert!(multi < set && set < rpush && rpush < exec);
        assert!(!packed.contains("\"videos\":[\"v1\"]"));
    }
}

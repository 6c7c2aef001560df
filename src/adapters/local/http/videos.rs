use super::error::ApiError;
use super::extractors::MaybeUser;
use super::AppState;
use crate::domain::export::{self, ExportFormat};
use crate::domain::jobs::{Video, VideoQuery};
use crate::domain::users::Principal;
use crate::ports::storage::ByteStream;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::io;

const UPLOAD_FIELD: &str = "video";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub message: String,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

/// Owned videos are only visible to their owner; ownerless ones to everybody.
fn authorize(video: &Video, principal: Option<&Principal>) -> Result<(), ApiError> {
    match (&video.owner, principal) {
        (None, _) => Ok(()),
        (Some(_), None) => Err(ApiError::Unauthorized(
            "Authentication required".to_string(),
        )),
        (Some(owner), Some(principal)) if *owner == principal.user_id => Ok(()),
        (Some(_), Some(_)) => Err(ApiError::Forbidden),
    }
}

async fn load_visible(
    state: &AppState,
    video_id: &str,
    principal: Option<&Principal>,
) -> Result<Video, ApiError> {
    let video = state.videos.find_video(video_id).await?;
    authorize(&video, principal)?;
    Ok(video)
}

// Streams the `video` field into storage, then starts processing in the background.
pub async fn upload(
    State(state): State<AppState>,
    MaybeUser(principal): MaybeUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let mimetype = field.content_type().unwrap_or_default().to_string();
        let body: ByteStream<'_> =
            Box::pin(field.map_err(|err| io::Error::new(io::ErrorKind::Other, err)));

        let video = state
            .uploads
            .accept(&original_name, &mimetype, body, principal.as_ref())
            .await?;

        return Ok(Json(UploadResponse {
            id: video.id,
            message: "Video uploaded successfully".to_string(),
            filename: video.filename,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

pub async fn list(
    State(state): State<AppState>,
    MaybeUser(principal): MaybeUser,
) -> Result<Json<Vec<Video>>, ApiError> {
    let query = VideoQuery::for_owner(principal.map(|p| p.user_id));
    Ok(Json(state.videos.list_videos(&query).await?))
}

pub async fn get(
    State(state): State<AppState>,
    MaybeUser(principal): MaybeUser,
    Path(video_id): Path<String>,
) -> Result<Json<Video>, ApiError> {
    Ok(Json(load_visible(&state, &video_id, principal.as_ref()).await?))
}

pub async fn export(
    State(state): State<AppState>,
    MaybeUser(principal): MaybeUser,
    Path(video_id): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let video = load_visible(&state, &video_id, principal.as_ref()).await?;
    let format = ExportFormat::parse(params.format.as_deref().unwrap_or("json"))
        .ok_or_else(|| ApiError::BadRequest("Unsupported format".to_string()))?;

    let export = export::render(&video, format).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [
            (CONTENT_TYPE, export.content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={}", export.filename),
            ),
        ],
        export.body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: &str) -> Principal {
        Principal {
            user_id: id.to_string(),
            email: format!("{}@example.com", id),
        }
    }

    fn video_owned_by(owner: Option<&str>) -> Video {
        Video::from_upload(crate::domain::jobs::NewVideo {
            filename: "video-1.mp4".to_string(),
            original_name: "lecture.mp4".to_string(),
            mimetype: "video/mp4".to_string(),
            size: 1,
            duration: None,
            owner: owner.map(str::to_string),
        })
    }

    #[test]
    fn test_authorize() {
        let anonymous = video_owned_by(None);
        assert!(authorize(&anonymous, None).is_ok());
        assert!(authorize(&anonymous, Some(&principal("u1"))).is_ok());

        let owned = video_owned_by(Some("u1"));
        assert!(authorize(&owned, Some(&principal("u1"))).is_ok());
        assert!(matches!(
            authorize(&owned, None),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(&owned, Some(&principal("u2"))),
            Err(ApiError::Forbidden)
        ));
    }
}

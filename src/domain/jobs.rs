use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress values written at each pipeline transition.
pub mod milestones {
    pub const UPLOADED: f64 = 0.0;
    pub const TRANSCRIBING: f64 = 10.0;
    pub const TRANSCRIBED: f64 = 50.0;
    pub const QUESTIONS_ATTEMPTED: f64 = 90.0;
    pub const COMPLETED: f64 = 100.0;
}

/// Progress after `completed` of `total` segments have had questions attempted.
///
/// Interpolates linearly between `TRANSCRIBED` and `QUESTIONS_ATTEMPTED`.
pub fn segment_progress(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return milestones::QUESTIONS_ATTEMPTED;
    }
    let span = milestones::QUESTIONS_ATTEMPTED - milestones::TRANSCRIBED;
    milestones::TRANSCRIBED + (completed.min(total) as f64 / total as f64) * span
}

/// Lifecycle of a video job.
///
/// `uploaded → transcribing → processing → completed`, with `error` reachable
/// from either transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Uploaded,
    Transcribing,
    Processing,
    Completed,
    Error,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Transcribing => "transcribing",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Error => "error",
        }
    }

    /// Completed and failed jobs never change status or progress again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Error)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(VideoStatus::Uploaded),
            "transcribing" => Ok(VideoStatus::Transcribing),
            "processing" => Ok(VideoStatus::Processing),
            "completed" => Ok(VideoStatus::Completed),
            "error" => Ok(VideoStatus::Error),
            other => Err(format!("unknown video status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Unknown labels fall back to `Medium`.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question: String,
    /// Expected to hold four options; not enforced.
    pub options: Vec<String>,
    /// Zero-based index into `options`.
    pub correct_answer: usize,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// A fixed window of the source video with its text and quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    /// Window start in seconds
    pub start_time: u64,
    /// Window boundary in seconds, always `start_time + window length`
    pub end_time: u64,
    pub text: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// A job: one uploaded video and its derived transcript and quiz state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    /// Name of the stored media file inside the upload directory
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub upload_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub status: VideoStatus,
    pub progress: f64,
    pub current_step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Attributes of a freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: u64,
    pub duration: Option<f64>,
    pub owner: Option<String>,
}

impl Video {
    pub fn from_upload(upload: NewVideo) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: upload.filename,
            original_name: upload.original_name,
            mimetype: upload.mimetype,
            size: upload.size,
            duration: upload.duration,
            upload_date: Utc::now(),
            owner: upload.owner,
            status: VideoStatus::Uploaded,
            progress: milestones::UPLOADED,
            current_step: "File uploaded successfully".to_string(),
            transcript: None,
            segments: Vec::new(),
            error_message: None,
        }
    }
}

/// Partial update of the pipeline fields of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: VideoStatus,
    pub progress: f64,
    pub current_step: String,
    /// Only written when present; an absent message leaves the stored one untouched.
    pub error_message: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: VideoStatus, progress: f64, current_step: impl Into<String>) -> Self {
        Self {
            status,
            progress,
            current_step: current_step.into(),
            error_message: None,
        }
    }

    pub fn failed(progress: f64, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: VideoStatus::Error,
            progress,
            current_step: format!("Error: {}", message),
            error_message: Some(message),
        }
    }
}

/// Filter, sort and limit for listing jobs. Results are newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoQuery {
    /// `Some(user)` lists that user's videos, `None` lists ownerless ones.
    pub owner: Option<String>,
    pub limit: usize,
}

impl VideoQuery {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn for_owner(owner: Option<String>) -> Self {
        Self {
            owner,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

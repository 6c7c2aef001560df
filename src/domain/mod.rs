//! Domain layer - Pure business logic.

pub mod export;
pub mod jobs;
pub mod quiz;
pub mod segmenter;
pub mod transcription;
pub mod users;

use serde::{Deserialize, Serialize};

/// A small timed unit of text returned by the speech-to-text capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Seconds from the start of the media
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Full output of a transcription, fragments ordered and non-overlapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    #[serde(default)]
    pub segments: Vec<Fragment>,
    #[serde(default)]
    pub language: String,
}

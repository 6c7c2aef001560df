use crate::domain::quiz::GeneratedQuestion;
use crate::domain::transcription::TranscriptionResult;
use crate::error::AiError;
use crate::ports::ai::{AiHealthPort, QuestionGenerationPort, TranscriptionPort};
use crate::ports::storage::MediaHandle;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

/// Client for the external transcription and question generation service.
#[derive(Clone, Debug)]
pub struct HttpAiClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct QuestionRequest<'a> {
    text: &'a str,
    segment_number: usize,
    total_segments: usize,
}

#[derive(Deserialize)]
struct QuestionResponse {
    questions: Vec<GeneratedQuestion>,
}

impl HttpAiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn upload_for_transcription(
        &self,
        media: &MediaHandle,
    ) -> Result<TranscriptionResult, String> {
        let file = tokio::fs::File::open(&media.path)
            .await
            .map_err(|e| format!("cannot open {:?}: {}", media.path, e))?;
        let length = file.metadata().await.map_err(|e| e.to_string())?.len();

        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
            .file_name(media.filename.clone())
            .mime_str(&media.mimetype)
            .map_err(|e| e.to_string())?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/transcribe"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("service returned {}: {}", status, body));
        }
        response
            .json::<TranscriptionResult>()
            .await
            .map_err(|e| format!("invalid response: {}", e))
    }

    async fn request_questions(
        &self,
        text: &str,
        ordinal: usize,
        total: usize,
    ) -> Result<Vec<GeneratedQuestion>, String> {
        let response = self
            .client
            .post(self.url("/generate-questions"))
            .json(&QuestionRequest {
                text,
                segment_number: ordinal,
                total_segments: total,
            })
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("service returned {}: {}", status, body));
        }
        response
            .json::<QuestionResponse>()
            .await
            .map(|r| r.questions)
            .map_err(|e| format!("invalid response: {}", e))
    }
}

#[async_trait]
impl TranscriptionPort for HttpAiClient {
    async fn transcribe(&self, media: &MediaHandle) -> Result<TranscriptionResult, AiError> {
        debug!("Requesting transcription of {}", media.filename);
        self.upload_for_transcription(media).await.map_err(|detail| {
            error!("Transcription error for {}: {}", media.filename, detail);
            AiError::TranscriptionFailed(detail)
        })
    }
}

#[async_trait]
impl QuestionGenerationPort for HttpAiClient {
    async fn generate_questions(
        &self,
        text: &str,
        ordinal: usize,
        total: usize,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        self.request_questions(text, ordinal, total)
            .await
            .map_err(|detail| {
                error!("Question generation error for segment {}/{}: {}", ordinal, total, detail);
                AiError::QuestionGenerationFailed(detail)
            })
    }
}

#[async_trait]
impl AiHealthPort for HttpAiClient {
    async fn health_check(&self) -> bool {
        match self.client.get(self.url("/health")).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("AI service health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn handle(path: PathBuf) -> MediaHandle {
        MediaHandle {
            path,
            filename: "video-1.mp4".to_string(),
            mimetype: "video/mp4".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transcribe_posts_file_and_parses_result() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/transcribe")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data.*".to_string()),
            )
            .match_body(Matcher::Regex("name=\"file\"".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"text":"Hello world","segments":[{"start":0.0,"end":2.5,"text":"Hello world"}],"language":"en"}"#,
            )
            .create_async()
            .await;
        let dir = tempdir().unwrap();
        let path = dir.path().join("video-1.mp4");
        std::fs::write(&path, b"fake video bytes").unwrap();

        let client = HttpAiClient::new(server.url());
        let result = client.transcribe(&handle(path)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.text, "Hello world");
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].end, 2.5);
        assert_eq!(result.language, "en");
    }

    #[tokio::test]
    async fn test_transcribe_server_error_is_transcription_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/transcribe")
            .with_status(500)
            .with_body("model crashed")
            .create_async()
            .await;
        let dir = tempdir().unwrap();
        let path = dir.path().join("video-1.mp4");
        std::fs::write(&path, b"x").unwrap();

        let client = HttpAiClient::new(server.url());
        let result = client.transcribe(&handle(path)).await;

        assert!(matches!(result, Err(AiError::TranscriptionFailed(_))));
    }

    #[tokio::test]
    async fn test_transcribe_missing_file_fails_without_request() {
        let client = HttpAiClient::new("http://127.0.0.1:9");
        let result = client
            .transcribe(&handle(PathBuf::from("/nonexistent/video.mp4")))
            .await;

        assert!(matches!(result, Err(AiError::TranscriptionFailed(_))));
    }

    #[tokio::test]
    async fn test_generate_questions_sends_segment_position() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/generate-questions")
            .match_body(Matcher::Json(serde_json::json!({
                "text": "Ownership rules",
                "segment_number": 2,
                "total_segments": 3
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"questions":[{"question":"Who owns a value?","options":["a","b","c","d"],"correct_answer":1,"difficulty":"hard","topic":"ownership"}]}"#,
            )
            .create_async()
            .await;

        let client = HttpAiClient::new(format!("{}/", server.url()));
        let questions = client
            .generate_questions("Ownership rules", 2, 3)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, 1);
        assert_eq!(questions[0].difficulty, "hard");
    }

    #[tokio::test]
    async fn test_generate_questions_malformed_body_fails() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/generate-questions")
            .with_status(200)
            .with_body(r#"{"unexpected":true}"#)
            .create_async()
            .await;

        let client = HttpAiClient::new(server.url());
        let result = client.generate_questions("text", 1, 1).await;

        assert!(matches!(result, Err(AiError::QuestionGenerationFailed(_))));
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"healthy"}"#)
            .create_async()
            .await;

        assert!(HttpAiClient::new(server.url()).health_check().await);
        assert!(!HttpAiClient::new("http://127.0.0.1:9").health_check().await);
    }
}

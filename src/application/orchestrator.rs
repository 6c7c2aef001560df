use crate::application::launcher::JobRunner;
use crate::domain::jobs::{milestones, segment_progress, StatusUpdate, Video, VideoStatus};
use crate::domain::quiz::SegmentOutcome;
use crate::domain::segmenter::create_segments;
use crate::error::PipelineError;
use crate::ports::ai::{QuestionGenerationPort, TranscriptionPort};
use crate::ports::repository::VideoRepository;
use crate::ports::storage::MediaStorage;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

/// Drives one job from `uploaded` to `completed` or `error`.
pub struct OrchestratorService<S, T, Q, R> {
    storage: S,
    transcriber: T,
    questions: Q,
    repo: R,
    segment_duration: u64,
}

impl<S, T, Q, R> OrchestratorService<S, T, Q, R>
where
    S: MediaStorage,
    T: TranscriptionPort,
    Q: QuestionGenerationPort,
    R: VideoRepository,
{
    pub fn new(storage: S, transcriber: T, questions: Q, repo: R, segment_duration: u64) -> Self {
        Self {
            storage,
            transcriber,
            questions,
            repo,
            segment_duration,
        }
    }

    /// Run the pipeline for one job. Every failure ends up on the job record;
    /// nothing is returned to the caller.
    pub async fn run(&self, video_id: &str) {
        let video = match self.repo.find_video(video_id).await {
            Ok(video) => video,
            Err(e) => {
                error!(video_id, "Cannot start processing: {}", e);
                return;
            }
        };

        if video.status != VideoStatus::Uploaded {
            if video.status.is_terminal() {
                warn!(video_id, status = %video.status, "Video already processed, not running again");
            } else {
                warn!(video_id, status = %video.status, "Video is already being processed");
            }
            return;
        }

        let mut progress = video.progress;
        let outcome = AssertUnwindSafe(self.process(&video, &mut progress))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PipelineError::Aborted(panic_message(panic.as_ref()))));
        if let Err(e) = outcome {
            error!(video_id, "Video processing failed: {}", e);
            let update = StatusUpdate::failed(progress, e.to_string());
            if let Err(write_err) = self.repo.update_status(video_id, &update).await {
                error!(video_id, "Failed to record processing error: {}", write_err);
            }
        }
    }

    /// `progress` tracks the last value written so a failure can keep it.
    async fn process(&self, video: &Video, progress: &mut f64) -> Result<(), PipelineError> {
        let video_id = video.id.as_str();

        self.write_status(
            video_id,
            progress,
            VideoStatus::Transcribing,
            milestones::TRANSCRIBING,
            "Starting transcription...",
        )
        .await?;

        let media = self.storage.resolve(&video.filename, &video.mimetype)?;
        let transcription = self.transcriber.transcribe(&media).await?;
        info!(
            video_id,
            fragments = transcription.segments.len(),
            language = %transcription.language,
            "Transcription completed"
        );

        self.write_status(
            video_id,
            progress,
            VideoStatus::Processing,
            milestones::TRANSCRIBED,
            "Transcription completed, generating questions...",
        )
        .await?;

        let mut segments = create_segments(&transcription, self.segment_duration);
        let total = segments.len();
        let mut failed = 0;

        for (index, segment) in segments.iter_mut().enumerate() {
            let ordinal = index + 1;
            let outcome = match self
                .questions
                .generate_questions(&segment.text, ordinal, total)
                .await
            {
                Ok(generated) => SegmentOutcome::from_generated(generated),
                Err(e) => {
                    warn!(video_id, segment = ordinal, "Continuing without questions: {}", e);
                    SegmentOutcome::Failed(e.to_string())
                }
            };
            if outcome.is_failure() {
                failed += 1;
            }
            segment.apply_outcome(outcome);

            self.write_status(
                video_id,
                progress,
                VideoStatus::Processing,
                segment_progress(ordinal, total),
                format!("Generated questions for segment {}/{}", ordinal, total),
            )
            .await?;
        }

        self.repo
            .save_results(video_id, &transcription.text, &segments)
            .await?;

        self.write_status(
            video_id,
            progress,
            VideoStatus::Completed,
            milestones::COMPLETED,
            "Processing completed successfully!",
        )
        .await?;

        info!(
            video_id,
            segments = total,
            failed_segments = failed,
            "Video processing completed"
        );
        Ok(())
    }

    async fn write_status(
        &self,
        video_id: &str,
        progress: &mut f64,
        status: VideoStatus,
        value: f64,
        step: impl Into<String>,
    ) -> Result<(), PipelineError> {
        let update = StatusUpdate::new(status, value, step);
        self.repo.update_status(video_id, &update).await?;
        *progress = value;
        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}

#[async_trait]
impl<S, T, Q, R> JobRunner for OrchestratorService<S, T, Q, R>
where
    S: MediaStorage + 'static,
    T: TranscriptionPort + 'static,
    Q: QuestionGenerationPort + 'static,
    R: VideoRepository + 'static,
{
    async fn run(&self, video_id: &str) {
        OrchestratorService::run(self, video_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::fs::FsAdapter;
    use crate::adapters::local::memory::MemoryStore;
    use crate::application::launcher::PipelineLauncher;
    use crate::domain::jobs::{NewVideo, Segment, VideoQuery};
    use crate::domain::quiz::GeneratedQuestion;
    use crate::domain::transcription::{Fragment, TranscriptionResult};
    use crate::error::{AiError, RepositoryError};
    use crate::ports::ai::{MockQuestionGenerationPort, MockTranscriptionPort};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Write {
        Status(StatusUpdate),
        Results(usize),
    }

    /// MemoryStore that remembers the order of pipeline writes.
    #[derive(Clone, Default)]
    struct RecordingStore {
        inner: MemoryStore,
        writes: Arc<Mutex<Vec<Write>>>,
    }

    impl RecordingStore {
        fn writes(&self) -> Vec<Write> {
            self.writes.lock().unwrap().clone()
        }

        fn progress_values(&self) -> Vec<f64> {
            self.writes()
                .into_iter()
                .filter_map(|w| match w {
                    Write::Status(update) => Some(update.progress),
                    Write::Results(_) => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl VideoRepository for RecordingStore {
        async fn insert_video(&self, video: &Video) -> Result<(), RepositoryError> {
            self.inner.insert_video(video).await
        }

        async fn find_video(&self, video_id: &str) -> Result<Video, RepositoryError> {
            self.inner.find_video(video_id).await
        }

        async fn update_status(
            &self,
            video_id: &str,
            update: &StatusUpdate,
        ) -> Result<(), RepositoryError> {
            self.writes.lock().unwrap().push(Write::Status(update.clone()));
            self.inner.update_status(video_id, update).await
        }

        async fn save_results(
            &self,
            video_id: &str,
            transcript: &str,
            segments: &[Segment],
        ) -> Result<(), RepositoryError> {
            self.writes.lock().unwrap().push(Write::Results(segments.len()));
            self.inner.save_results(video_id, transcript, segments).await
        }

        async fn list_videos(&self, query: &VideoQuery) -> Result<Vec<Video>, RepositoryError> {
            self.inner.list_videos(query).await
        }
    }

    fn fragment(start: f64, end: f64, text: &str) -> Fragment {
        Fragment {
            start,
            end,
            text: text.to_string(),
        }
    }

    fn transcription(fragments: Vec<Fragment>) -> TranscriptionResult {
        TranscriptionResult {
            text: fragments
                .iter()
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            segments: fragments,
            language: "en".to_string(),
        }
    }

    fn question(text: &str) -> GeneratedQuestion {
        GeneratedQuestion {
            question: format!("What about {}?", text),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            difficulty: "easy".to_string(),
            topic: Some("basics".to_string()),
        }
    }

    fn transcriber_returning(result: TranscriptionResult) -> MockTranscriptionPort {
        let mut transcriber = MockTranscriptionPort::new();
        transcriber
            .expect_transcribe()
            .times(1)
            .returning(move |_| Ok(result.clone()));
        transcriber
    }

    async fn seeded_store() -> (RecordingStore, String) {
        let store = RecordingStore::default();
        let video = Video::from_upload(NewVideo {
            filename: "video-1-abc.mp4".to_string(),
            original_name: "lecture.mp4".to_string(),
            mimetype: "video/mp4".to_string(),
            size: 100,
            duration: Some(900.0),
            owner: None,
        });
        store.insert_video(&video).await.unwrap();
        (store, video.id)
    }

    fn service(
        transcriber: MockTranscriptionPort,
        questions: MockQuestionGenerationPort,
        store: RecordingStore,
    ) -> OrchestratorService<FsAdapter, MockTranscriptionPort, MockQuestionGenerationPort, RecordingStore>
    {
        OrchestratorService::new(
            FsAdapter::new("/tmp/lectern-uploads", 1024),
            transcriber,
            questions,
            store,
            300,
        )
    }

    #[tokio::test]
    async fn test_successful_run_reports_monotonic_progress() {
        let (store, id) = seeded_store().await;
        let transcriber = transcriber_returning(transcription(vec![
            fragment(0.0, 30.0, "intro"),
            fragment(290.0, 310.0, "next"),
            fragment(600.0, 620.0, "end"),
        ]));
        let mut questions = MockQuestionGenerationPort::new();
        questions
            .expect_generate_questions()
            .times(2)
            .returning(|text, _, _| Ok(vec![question(text)]));

        service(transcriber, questions, store.clone()).run(&id).await;

        assert_eq!(store.progress_values(), vec![10.0, 50.0, 70.0, 90.0, 100.0]);
        let writes = store.writes();
        assert_eq!(writes[writes.len() - 2], Write::Results(2));
        assert!(matches!(
            writes.last(),
            Some(Write::Status(update)) if update.status == VideoStatus::Completed
        ));

        let video = store.find_video(&id).await.unwrap();
        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.progress, 100.0);
        assert_eq!(video.transcript.as_deref(), Some("intro next end"));
        assert_eq!(video.segments.len(), 2);
        assert_eq!(video.segments[0].text, "intro next");
        assert_eq!(video.segments[1].start_time, 600);
        assert!(video.segments.iter().all(|s| s.questions.len() == 1));
        assert!(video.error_message.is_none());
    }

    #[tokio::test]
    async fn test_questions_receive_ordinal_and_total() {
        let (store, id) = seeded_store().await;
        let transcriber = transcriber_returning(transcription(vec![
            fragment(0.0, 10.0, "one"),
            fragment(300.0, 310.0, "two"),
        ]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();
        let mut questions = MockQuestionGenerationPort::new();
        questions
            .expect_generate_questions()
            .returning(move |text, ordinal, total| {
                recorded
                    .lock()
                    .unwrap()
                    .push((text.to_string(), ordinal, total));
                Ok(Vec::new())
            });

        service(transcriber, questions, store).run(&id).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("one".to_string(), 1, 2), ("two".to_string(), 2, 2)]
        );
    }

    #[tokio::test]
    async fn test_transcription_failure_is_fatal() {
        let (store, id) = seeded_store().await;
        let mut transcriber = MockTranscriptionPort::new();
        transcriber
            .expect_transcribe()
            .returning(|_| Err(AiError::TranscriptionFailed("service down".to_string())));
        let mut questions = MockQuestionGenerationPort::new();
        questions.expect_generate_questions().never();

        service(transcriber, questions, store.clone()).run(&id).await;

        assert!(!store.writes().iter().any(|w| matches!(w, Write::Results(_))));
        let video = store.find_video(&id).await.unwrap();
        assert_eq!(video.status, VideoStatus::Error);
        assert_eq!(video.progress, 10.0);
        assert_eq!(
            video.error_message.as_deref(),
            Some("Transcription failed: service down")
        );
        assert_eq!(video.current_step, "Error: Transcription failed: service down");
        assert!(video.segments.is_empty());
    }

    #[tokio::test]
    async fn test_single_segment_failure_is_tolerated() {
        let (store, id) = seeded_store().await;
        let transcriber = transcriber_returning(transcription(vec![
            fragment(0.0, 10.0, "first"),
            fragment(300.0, 310.0, "second"),
            fragment(600.0, 610.0, "third"),
        ]));
        let mut questions = MockQuestionGenerationPort::new();
        questions
            .expect_generate_questions()
            .times(3)
            .returning(|text, ordinal, _| {
                if ordinal == 2 {
                    Err(AiError::QuestionGenerationFailed("timeout".to_string()))
                } else {
                    Ok(vec![question(text)])
                }
            });

        service(transcriber, questions, store.clone()).run(&id).await;

        let video = store.find_video(&id).await.unwrap();
        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.segments.len(), 3);
        assert_eq!(video.segments[0].questions.len(), 1);
        assert!(video.segments[1].questions.is_empty());
        assert_eq!(video.segments[2].questions.len(), 1);
        assert!(video.error_message.is_none());
    }

    #[tokio::test]
    async fn test_every_segment_failing_still_completes() {
        let (store, id) = seeded_store().await;
        let transcriber = transcriber_returning(transcription(vec![
            fragment(0.0, 10.0, "first"),
            fragment(300.0, 310.0, "second"),
        ]));
        let mut questions = MockQuestionGenerationPort::new();
        questions
            .expect_generate_questions()
            .returning(|_, _, _| Err(AiError::QuestionGenerationFailed("nope".to_string())));

        service(transcriber, questions, store.clone()).run(&id).await;

        let video = store.find_video(&id).await.unwrap();
        assert_eq!(video.status, VideoStatus::Completed);
        assert_eq!(video.progress, 100.0);
        assert!(video.segments.iter().all(|s| s.questions.is_empty()));
        assert!(video.error_message.is_none());
    }

    #[tokio::test]
    async fn test_empty_transcription_completes_without_segments() {
        let (store, id) = seeded_store().await;
        let transcriber = transcriber_returning(transcription(Vec::new()));
        let mut questions = MockQuestionGenerationPort::new();
        questions.expect_generate_questions().never();

        service(transcriber, questions, store.clone()).run(&id).await;

        assert_eq!(store.progress_values(), vec![10.0, 50.0, 100.0]);
        let video = store.find_video(&id).await.unwrap();
        assert_eq!(video.status, VideoStatus::Completed);
        assert!(video.segments.is_empty());
    }

    #[tokio::test]
    async fn test_refuses_video_not_in_uploaded_state() {
        let (store, id) = seeded_store().await;
        store
            .inner
            .update_status(&id, &StatusUpdate::new(VideoStatus::Completed, 100.0, "done"))
            .await
            .unwrap();
        let mut transcriber = MockTranscriptionPort::new();
        transcriber.expect_transcribe().never();
        let mut questions = MockQuestionGenerationPort::new();
        questions.expect_generate_questions().never();

        service(transcriber, questions, store.clone()).run(&id).await;

        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_video_writes_nothing() {
        let store = RecordingStore::default();
        let mut transcriber = MockTranscriptionPort::new();
        transcriber.expect_transcribe().never();
        let mut questions = MockQuestionGenerationPort::new();
        questions.expect_generate_questions().never();

        service(transcriber, questions, store.clone()).run("missing").await;

        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unsafe_stored_filename_fails_the_job() {
        let store = RecordingStore::default();
        let video = Video::from_upload(NewVideo {
            filename: "../escape.mp4".to_string(),
            original_name: "lecture.mp4".to_string(),
            mimetype: "video/mp4".to_string(),
            size: 1,
            duration: None,
            owner: None,
        });
        store.insert_video(&video).await.unwrap();
        let mut transcriber = MockTranscriptionPort::new();
        transcriber.expect_transcribe().never();

        service(transcriber, MockQuestionGenerationPort::new(), store.clone())
            .run(&video.id)
            .await;

        let stored = store.find_video(&video.id).await.unwrap();
        assert_eq!(stored.status, VideoStatus::Error);
        assert!(stored
            .error_message
            .unwrap_or_default()
            .starts_with("media unavailable"));
    }

    struct CrashingGenerator;

    #[async_trait]
    impl QuestionGenerationPort for CrashingGenerator {
        async fn generate_questions(
            &self,
            _text: &str,
            _segment_number: usize,
            _total_segments: usize,
        ) -> Result<Vec<GeneratedQuestion>, AiError> {
            panic!("generator crashed")
        }
    }

    #[tokio::test]
    async fn test_panic_during_launched_run_marks_job_failed() {
        let (store, id) = seeded_store().await;
        let transcriber = transcriber_returning(transcription(vec![fragment(0.0, 1.0, "a")]));
        let orchestrator = OrchestratorService::new(
            FsAdapter::new("/tmp/lectern-uploads", 1024),
            transcriber,
            CrashingGenerator,
            store.clone(),
            300,
        );
        let launcher = PipelineLauncher::new(Arc::new(orchestrator));

        launcher.launch(&id).unwrap().await.unwrap();

        assert!(!launcher.is_running(&id));
        let video = store.find_video(&id).await.unwrap();
        assert_eq!(video.status, VideoStatus::Error);
        assert_eq!(video.progress, 50.0);
        assert_eq!(
            video.error_message.as_deref(),
            Some("processing aborted: generator crashed")
        );
    }
}

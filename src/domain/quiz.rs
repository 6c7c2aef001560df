use super::jobs::{Difficulty, Question, Segment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A question as produced by the question generation capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub topic: Option<String>,
}

impl GeneratedQuestion {
    pub fn into_question(self) -> Question {
        Question {
            id: Uuid::new_v4().to_string(),
            question: self.question,
            options: self.options,
            correct_answer: self.correct_answer,
            difficulty: Difficulty::parse_lenient(&self.difficulty),
            topic: self.topic.filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Result of attempting question synthesis for one segment.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    Generated(Vec<Question>),
    Failed(String),
}

impl SegmentOutcome {
    pub fn from_generated(generated: Vec<GeneratedQuestion>) -> Self {
        SegmentOutcome::Generated(
            generated
                .into_iter()
                .map(GeneratedQuestion::into_question)
                .collect(),
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SegmentOutcome::Failed(_))
    }
}

impl Segment {
    /// Attaches the outcome to this segment. A failure leaves the segment with
    /// an empty quiz; it never invalidates the rest of the batch.
    pub fn apply_outcome(&mut self, outcome: SegmentOutcome) {
        self.questions = match outcome {
            SegmentOutcome::Generated(questions) => questions,
            SegmentOutcome::Failed(_) => Vec::new(),
        };
    }
}

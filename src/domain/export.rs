//! Stateless renderers for exporting a finished quiz.

use super::jobs::{Segment, Video};
use serde_json::json;
use std::fmt::Write;

const CSV_HEADER: &str = "Segment,Start Time,End Time,Question,Option A,Option B,Option C,Option D,Correct Answer,Difficulty,Topic";
const OPTION_LETTERS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Text,
}

impl ExportFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format.to_ascii_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "txt" | "text" => Some(ExportFormat::Text),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
        }
    }
}

/// A rendered export ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

pub fn render(video: &Video, format: ExportFormat) -> Result<Export, serde_json::Error> {
    let body = match format {
        ExportFormat::Json => render_json(video)?,
        ExportFormat::Csv => render_csv(video),
        ExportFormat::Text => render_text(video),
    };
    Ok(Export {
        filename: format!("quiz-{}.{}", video.id, format.extension()),
        content_type: format.content_type(),
        body,
    })
}

pub fn render_json(video: &Video) -> Result<String, serde_json::Error> {
    let document = json!({
        "videoInfo": {
            "id": video.id,
            "originalName": video.original_name,
            "duration": video.duration,
        },
        "segments": video.segments,
    });
    serde_json::to_string_pretty(&document)
}

/// One row per question; segment numbers and correct answers are 1-based.
pub fn render_csv(video: &Video) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for (index, segment) in video.segments.iter().enumerate() {
        for question in &segment.questions {
            let option = |i: usize| csv_field(question.options.get(i).map_or("", String::as_str));
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{}",
                index + 1,
                segment.start_time,
                segment.end_time,
                csv_field(&question.question),
                option(0),
                option(1),
                option(2),
                option(3),
                question.correct_answer + 1,
                question.difficulty.as_str(),
                csv_field(question.topic.as_deref().unwrap_or("")),
            );
        }
    }
    out
}

pub fn render_text(video: &Video) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quiz: {}", video.original_name);

    if video.segments.is_empty() {
        out.push_str("\nNo segments available.\n");
        return out;
    }

    for (index, segment) in video.segments.iter().enumerate() {
        out.push('\n');
        write_text_segment(&mut out, index + 1, segment);
    }
    out
}

fn write_text_segment(out: &mut String, number: usize, segment: &Segment) {
    let _ = writeln!(
        out,
        "Segment {} ({} - {})",
        number,
        timestamp(segment.start_time),
        timestamp(segment.end_time)
    );
    if segment.questions.is_empty() {
        out.push_str("  No questions generated.\n");
        return;
    }
    for (q_index, question) in segment.questions.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} [{}]",
            q_index + 1,
            question.question,
            question.difficulty.as_str()
        );
        for (o_index, option) in question.options.iter().enumerate() {
            let _ = writeln!(out, "   {}) {}", letter(o_index), option);
        }
        let _ = writeln!(out, "   Answer: {}", letter(question.correct_answer));
    }
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn letter(index: usize) -> char {
    OPTION_LETTERS.get(index).copied().unwrap_or('?')
}

fn timestamp(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

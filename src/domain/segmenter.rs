//! Partitions a timed transcript into fixed-duration segments.

use super::jobs::Segment;
use super::transcription::TranscriptionResult;
use uuid::Uuid;

/// Default window length in seconds (5 minutes).
pub const DEFAULT_SEGMENT_DURATION: u64 = 300;

/// Groups transcript fragments into windows of `window` seconds.
///
/// A fragment belongs to the window its floored start time falls in. When a
/// fragment lands past the current window, the window snaps forward to the
/// grid position of that fragment; skipped windows produce no segment, so a
/// silent stretch longer than `window` leaves a gap in coverage.
///
/// Every segment's `end_time` is `start_time + window`, regardless of where
/// the spoken content actually ends, capped at `u64::MAX` for absurd start
/// times. Windows whose text is blank are dropped.
pub fn create_segments(result: &TranscriptionResult, window: u64) -> Vec<Segment> {
    let window = window.max(1);
    let mut segments = Vec::new();
    let mut window_start: u64 = 0;
    let mut buffer = String::new();

    for fragment in &result.segments {
        let start = fragment.start.max(0.0).floor() as u64;

        let grid_start = (start / window) * window;
        if grid_start > window_start {
            flush(&mut segments, window_start, window, &buffer);
            window_start = grid_start;
            buffer.clear();
        }

        let text = fragment.text.trim();
        if !text.is_empty() {
            if !buffer.is_empty() {
                buffer.push(' ');
            }
            buffer.push_str(text);
        }
    }
    flush(&mut segments, window_start, window, &buffer);

    segments
}

fn flush(segments: &mut Vec<Segment>, window_start: u64, window: u64, buffer: &str) {
    let text = buffer.trim();
    if text.is_empty() {
        return;
    }
    segments.push(Segment {
        id: Uuid::new_v4().to_string(),
        start_time: window_start,
        end_time: window_start.saturating_add(window),
        text: text.to_string(),
        questions: Vec::new(),
    });
}

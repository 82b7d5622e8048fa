//! Word-bounded chunking of transcript segments.
//!
//! Groups segments into overlapping chunks sized for embedding. Boundaries
//! are always at segment granularity; the word targets are soft.

use crate::transcript::TranscriptSegment;
use serde::{Deserialize, Serialize};

/// A group of consecutive segments prepared for embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Concatenated segment text, space-joined.
    pub text: String,
    /// Start time of the first contributing segment.
    pub start_time: f64,
    /// End time of the last contributing segment.
    pub end_time: f64,
    /// The contributing segments, in order.
    pub segments: Vec<TranscriptSegment>,
}

impl Chunk {
    fn from_segments(segments: Vec<TranscriptSegment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let start_time = segments.first().map(|s| s.start_time).unwrap_or(0.0);
        let end_time = segments.last().map(|s| s.end_time).unwrap_or(0.0);

        Self {
            text,
            start_time,
            end_time,
            segments,
        }
    }

    /// Total whitespace-delimited word count across contributing segments.
    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.word_count()).sum()
    }
}

/// Chunk segments greedily up to `max_words` per chunk, seeding each new
/// chunk with up to `overlap_words` worth of whole trailing segments from
/// the previous one.
///
/// A single segment larger than `max_words` still lands in its own chunk;
/// segments are never split. The final partial chunk is emitted even when
/// below the size target.
pub fn chunk_segments(
    segments: &[TranscriptSegment],
    max_words: usize,
    overlap_words: usize,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<TranscriptSegment> = Vec::new();
    let mut current_words = 0;

    for segment in segments {
        let segment_words = segment.word_count();

        if current_words + segment_words > max_words && !current.is_empty() {
            // Walk backward through the closed chunk, prepending whole
            // segments while they fit in the overlap budget.
            let mut overlap: Vec<TranscriptSegment> = Vec::new();
            let mut overlap_count = 0;
            for prev in current.iter().rev() {
                let prev_words = prev.word_count();
                if overlap_count + prev_words > overlap_words {
                    break;
                }
                overlap.insert(0, prev.clone());
                overlap_count += prev_words;
            }

            chunks.push(Chunk::from_segments(current));
            current = overlap;
            current_words = overlap_count;
        }

        current.push(segment.clone());
        current_words += segment_words;
    }

    if !current.is_empty() {
        chunks.push(Chunk::from_segments(current));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str, start: f64, end: f64) -> TranscriptSegment {
        TranscriptSegment {
            text: text.to_string(),
            start_time: start,
            end_time: end,
            speaker: None,
        }
    }

    /// A segment with exactly `words` words.
    fn sized_segment(words: usize, start: f64) -> TranscriptSegment {
        segment(&vec!["word"; words].join(" "), start, start + 10.0)
    }

    #[test]
    fn test_single_chunk_under_limit() {
        let segments = vec![
            segment("one two three", 0.0, 5.0),
            segment("four five", 5.0, 10.0),
        ];

        let chunks = chunk_segments(&segments, 750, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "one two three four five");
        assert_eq!(chunks[0].start_time, 0.0);
        assert_eq!(chunks[0].end_time, 10.0);
    }

    #[test]
    fn test_chunks_cover_all_segments_in_order() {
        let segments: Vec<TranscriptSegment> =
            (0..10).map(|i| sized_segment(40, i as f64 * 10.0)).collect();

        let chunks = chunk_segments(&segments, 100, 30);

        // Ignoring overlap duplication, the concatenated chunks reproduce
        // the original sequence in order.
        let mut covered: Vec<f64> = Vec::new();
        for chunk in &chunks {
            for seg in &chunk.segments {
                if covered.last() != Some(&seg.start_time) && !covered.contains(&seg.start_time) {
                    covered.push(seg.start_time);
                }
            }
        }
        let expected: Vec<f64> = segments.iter().map(|s| s.start_time).collect();
        assert_eq!(covered, expected);

        for chunk in &chunks {
            assert!(chunk.word_count() <= 100);
        }
    }

    #[test]
    fn test_overlap_bound() {
        let segments: Vec<TranscriptSegment> =
            (0..8).map(|i| sized_segment(20, i as f64 * 10.0)).collect();

        let chunks = chunk_segments(&segments, 60, 25);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let first_starts: Vec<f64> = pair[0].segments.iter().map(|s| s.start_time).collect();
            let shared_words: usize = pair[1]
                .segments
                .iter()
                .filter(|s| first_starts.contains(&s.start_time))
                .map(|s| s.word_count())
                .sum();
            assert!(shared_words <= 25, "overlap {} exceeds bound", shared_words);
        }
    }

    #[test]
    fn test_oversized_segment_kept_whole() {
        let segments = vec![
            sized_segment(10, 0.0),
            sized_segment(200, 10.0),
            sized_segment(10, 20.0),
        ];

        let chunks = chunk_segments(&segments, 50, 0);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().any(|c| c.segments.len() == 1 && c.word_count() == 200));
        // Every chunk either fits the limit or holds a single oversized segment
        for chunk in &chunks {
            assert!(chunk.word_count() <= 50 || chunk.segments.len() == 1);
        }
    }

    #[test]
    fn test_final_partial_chunk_emitted() {
        let segments = vec![sized_segment(40, 0.0), sized_segment(40, 10.0), sized_segment(5, 20.0)];

        let chunks = chunk_segments(&segments, 50, 0);
        assert_eq!(chunks.len(), 2);
        // Trailing chunk stays even though it is below the size target
        assert_eq!(chunks.last().unwrap().word_count(), 45);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_segments(&[], 750, 50).is_empty());
    }
}

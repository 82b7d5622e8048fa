//! Transcript data model: parsed VTT segments and call metadata.

mod metadata;
mod parser;

pub use metadata::MetadataExtractor;
pub use parser::{parse_vtt_time, VttParser};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One parsed speech utterance with timing and optional speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Spoken text with any speaker markup stripped.
    pub text: String,
    /// Start time in seconds.
    pub start_time: f64,
    /// End time in seconds.
    pub end_time: f64,
    /// Speaker name, if attribution was present in the cue.
    pub speaker: Option<String>,
}

impl TranscriptSegment {
    /// Number of whitespace-delimited words in the segment text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Descriptive metadata about a call transcript, derived best-effort from
/// the file name and in-file NOTE headers. Absent fields stay `None`;
/// "Unknown" rendering belongs to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub file_path: String,
    pub file_name: String,
    pub client_name: Option<String>,
    pub call_date: Option<NaiveDate>,
    pub participants: Option<Vec<String>>,
    pub call_type: Option<String>,
}

impl TranscriptMetadata {
    /// Minimal metadata from a path alone, as the parser produces it.
    pub fn from_path(path: &Path) -> Self {
        Self {
            file_path: path.to_string_lossy().into_owned(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Merge extractor-derived metadata over parser-derived metadata.
    ///
    /// Extractor values take precedence on every populated field; parser
    /// values survive only where the extractor found nothing.
    pub fn merged_with(mut self, extracted: TranscriptMetadata) -> Self {
        if !extracted.file_path.is_empty() {
            self.file_path = extracted.file_path;
        }
        if !extracted.file_name.is_empty() {
            self.file_name = extracted.file_name;
        }
        if extracted.client_name.is_some() {
            self.client_name = extracted.client_name;
        }
        if extracted.call_date.is_some() {
            self.call_date = extracted.call_date;
        }
        if extracted.participants.is_some() {
            self.participants = extracted.participants;
        }
        if extracted.call_type.is_some() {
            self.call_type = extracted.call_type;
        }
        self
    }
}

/// A fully parsed transcript: ordered segments plus metadata.
///
/// Intermediate only; never persisted as-is.
#[derive(Debug, Clone)]
pub struct ParsedTranscript {
    pub segments: Vec<TranscriptSegment>,
    pub metadata: TranscriptMetadata,
}

impl ParsedTranscript {
    /// Full transcript text with speaker prefixes, one utterance per block.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| match &s.speaker {
                Some(speaker) => format!("{}: {}", speaker, s.text),
                None => s.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

//! Call metadata extraction from file names and VTT NOTE headers.
//!
//! Everything here is best-effort: a pattern that fails to match leaves the
//! field absent, it never errors.

use super::TranscriptMetadata;
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::path::Path;

/// Extracts descriptive call metadata from a transcript file.
///
/// Sources, in order of precedence: the file name (client, date, call type),
/// then NOTE headers in the file content (fills gaps; participants always
/// come from content), then the file's modification time as a date fallback.
pub struct MetadataExtractor {
    date_patterns: Vec<Regex>,
    client_re: Regex,
    date_re: Regex,
    participants_re: Regex,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self {
            date_patterns: vec![
                Regex::new(r"\d{4}-\d{2}-\d{2}").expect("Invalid regex"), // YYYY-MM-DD
                Regex::new(r"\d{2}-\d{2}-\d{4}").expect("Invalid regex"), // MM-DD-YYYY
                Regex::new(r"\d{8}").expect("Invalid regex"),             // YYYYMMDD
            ],
            client_re: Regex::new(r"(?i)client[:\s]+([^\n,]+)").expect("Invalid regex"),
            date_re: Regex::new(r"(?i)date[:\s]+([^\n,]+)").expect("Invalid regex"),
            participants_re: Regex::new(r"(?i)participants?[:\s]+([^\n]+)").expect("Invalid regex"),
        }
    }

    /// Extract metadata for `path`, scanning `content` headers when supplied.
    pub fn extract(&self, path: &Path, content: Option<&str>) -> TranscriptMetadata {
        let mut metadata = TranscriptMetadata::from_path(path);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.parse_filename(&stem, &mut metadata);

        if let Some(content) = content {
            self.parse_headers(content, &mut metadata);
        }

        // Fall back to the file's mtime when neither pass produced a date.
        // A missing file just leaves the date absent.
        if metadata.call_date.is_none() {
            if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
                let modified: DateTime<Utc> = modified.into();
                metadata.call_date = Some(modified.date_naive());
            }
        }

        metadata
    }

    /// Parse a filename stem like `Acme_2024-01-15_Sales`.
    fn parse_filename(&self, stem: &str, metadata: &mut TranscriptMetadata) {
        for pattern in &self.date_patterns {
            if let Some(m) = pattern.find(stem) {
                if let Some(date) = parse_date(m.as_str()) {
                    metadata.call_date = Some(date);

                    let before = stem[..m.start()].trim_matches(['_', '-']);
                    let after = stem[m.end()..].trim_matches(['_', '-']);
                    if !before.is_empty() {
                        metadata.client_name = Some(normalize_separators(before));
                    }
                    if !after.is_empty() {
                        metadata.call_type = Some(normalize_separators(after));
                    }
                    return;
                }
            }
        }

        // No recognizable date: first token is the client, the rest the type
        let mut parts = stem.split(['_', '-']).filter(|p| !p.trim().is_empty());
        if let Some(first) = parts.next() {
            metadata.client_name = Some(first.trim().to_string());
        }
        let rest: Vec<&str> = parts.collect();
        if !rest.is_empty() {
            metadata.call_type = Some(rest.join(" ").trim().to_string());
        }
    }

    /// Scan the first 20 lines for NOTE headers carrying metadata.
    ///
    /// Content values only fill fields the filename pass left empty, except
    /// participants, which are always taken from content when present.
    fn parse_headers(&self, content: &str, metadata: &mut TranscriptMetadata) {
        for line in content.lines().take(20) {
            let Some(note) = line.strip_prefix("NOTE") else {
                continue;
            };
            let note = note.trim();

            if metadata.client_name.is_none() {
                if let Some(caps) = self.client_re.captures(note) {
                    metadata.client_name = Some(caps[1].trim().to_string());
                }
            }

            if metadata.call_date.is_none() {
                if let Some(caps) = self.date_re.captures(note) {
                    metadata.call_date = parse_date(caps[1].trim());
                }
            }

            if let Some(caps) = self.participants_re.captures(note) {
                let participants: Vec<String> = caps[1]
                    .split([',', ';'])
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
                if !participants.is_empty() {
                    metadata.participants = Some(participants);
                }
            }
        }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a date string in YYYY-MM-DD, MM-DD-YYYY, or YYYYMMDD form.
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m-%d-%Y"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

/// Replace `_`/`-` separators with spaces.
fn normalize_separators(s: &str) -> String {
    s.replace(['_', '-'], " ").trim().to_string()
}

//! VTT caption parsing.
//!
//! Converts subtitle-style timestamped text into ordered transcript segments.
//! Malformed blocks are skipped, never errored: header blocks, cues without a
//! time range, and cues whose text is empty after stripping markup all simply
//! produce no segment.

use super::{ParsedTranscript, TranscriptMetadata, TranscriptSegment};
use regex::Regex;
use std::path::Path;

/// Parser for VTT caption files.
pub struct VttParser {
    block_split: Regex,
    time_range: Regex,
    voice_tag: Regex,
    voice_markup: Regex,
    speaker_prefix: Regex,
}

impl VttParser {
    pub fn new() -> Self {
        Self {
            // Cue blocks are separated by blank (possibly whitespace-only) lines
            block_split: Regex::new(r"\n\s*\n").expect("Invalid regex"),
            time_range: Regex::new(
                r"(\d{2}:\d{2}:\d{2}\.\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2}\.\d{3})",
            )
            .expect("Invalid regex"),
            voice_tag: Regex::new(r"<v\s+([^>]+)>").expect("Invalid regex"),
            voice_markup: Regex::new(r"<v[^>]*>|</v>").expect("Invalid regex"),
            speaker_prefix: Regex::new(r"^([^:]+):\s*(.+)$").expect("Invalid regex"),
        }
    }

    /// Parse VTT file contents into an ordered sequence of segments.
    ///
    /// Segments come out in file order; no sorting or validation of time
    /// monotonicity is performed.
    pub fn parse(&self, content: &str, path: &Path) -> ParsedTranscript {
        let mut segments = Vec::new();

        for block in self.block_split.split(content) {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }

            // Skip the WEBVTT header and NOTE/metadata blocks
            if block.starts_with("WEBVTT") || block.starts_with("NOTE") || !block.contains("-->") {
                continue;
            }

            if let Some(segment) = self.parse_cue(block) {
                segments.push(segment);
            }
        }

        ParsedTranscript {
            segments,
            metadata: TranscriptMetadata::from_path(path),
        }
    }

    /// Parse a single cue block into a segment, or None if malformed/empty.
    fn parse_cue(&self, block: &str) -> Option<TranscriptSegment> {
        let lines: Vec<&str> = block
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        // Text lines are the ones following the time-range line; anything
        // before it (cue identifiers) is dropped.
        let mut time_line = None;
        let mut text_lines = Vec::new();

        for line in lines {
            if line.contains("-->") && time_line.is_none() {
                time_line = Some(line);
            } else if time_line.is_some() {
                text_lines.push(line);
            }
        }

        let time_line = time_line?;
        if text_lines.is_empty() {
            return None;
        }

        let caps = self.time_range.captures(time_line)?;
        let start_time = parse_vtt_time(&caps[1])?;
        let end_time = parse_vtt_time(&caps[2])?;

        let mut text = text_lines.join(" ");
        let mut speaker = None;

        // Voice-tag attribution: <v Speaker Name>text</v>
        let tagged = self
            .voice_tag
            .captures(&text)
            .map(|caps| caps[1].trim().to_string());
        if let Some(name) = tagged {
            speaker = Some(name);
            text = self.voice_markup.replace_all(&text, "").trim().to_string();
        }

        // "Speaker: text" attribution, only when no voice tag matched
        if speaker.is_none() {
            let prefixed = self
                .speaker_prefix
                .captures(&text)
                .map(|caps| (caps[1].trim().to_string(), caps[2].trim().to_string()));
            if let Some((name, rest)) = prefixed {
                speaker = Some(name);
                text = rest;
            }
        }

        if text.is_empty() {
            return None;
        }

        Some(TranscriptSegment {
            text,
            start_time,
            end_time,
            speaker,
        })
    }
}

impl Default for VttParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a VTT timestamp (HH:MM:SS.mmm) to seconds.
pub fn parse_vtt_time(time_str: &str) -> Option<f64> {
    let mut parts = time_str.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;

    let mut sec_parts = parts.next()?.split('.');
    let seconds: f64 = sec_parts.next()?.parse().ok()?;
    let millis: f64 = sec_parts.next().unwrap_or("0").parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ParsedTranscript {
        VttParser::new().parse(content, Path::new("/calls/test.vtt"))
    }

    #[test]
    fn test_time_parsing() {
        assert_eq!(parse_vtt_time("01:02:03.456"), Some(3723.456));
        assert_eq!(parse_vtt_time("01:02:04.000"), Some(3724.0));
        assert_eq!(parse_vtt_time("00:00:00.000"), Some(0.0));
        assert_eq!(parse_vtt_time("garbage"), None);
    }

    #[test]
    fn test_basic_cues() {
        let content = "WEBVTT\n\n\
            00:00:01.000 --> 00:00:03.000\nHello world\n\n\
            00:00:03.000 --> 00:00:05.500\nSecond cue text\n";

        let transcript = parse(content);
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[0].text, "Hello world");
        assert_eq!(transcript.segments[0].start_time, 1.0);
        assert_eq!(transcript.segments[1].end_time, 5.5);
        assert_eq!(transcript.metadata.file_name, "test.vtt");
    }

    #[test]
    fn test_header_and_note_blocks_skipped() {
        let content = "WEBVTT\n\n\
            NOTE client: Acme\n\n\
            some stray block without times\n\n\
            00:00:01.000 --> 00:00:02.000\nReal cue\n";

        let transcript = parse(content);
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].text, "Real cue");
    }

    #[test]
    fn test_speaker_colon_prefix() {
        let content = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nJane Doe: Hello there\n";

        let transcript = parse(content);
        let segment = &transcript.segments[0];
        assert_eq!(segment.speaker.as_deref(), Some("Jane Doe"));
        assert_eq!(segment.text, "Hello there");
    }

    #[test]
    fn test_speaker_voice_tag() {
        let content = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n<v Jane Doe>Hello there</v>\n";

        let transcript = parse(content);
        let segment = &transcript.segments[0];
        assert_eq!(segment.speaker.as_deref(), Some("Jane Doe"));
        assert_eq!(segment.text, "Hello there");
    }

    #[test]
    fn test_multiline_cue_joined_with_space() {
        let content = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nFirst line\nsecond line\n";

        let transcript = parse(content);
        assert_eq!(transcript.segments[0].text, "First line second line");
    }

    #[test]
    fn test_cue_identifier_before_times_ignored() {
        let content = "WEBVTT\n\n42\n00:00:01.000 --> 00:00:02.000\nCue with identifier\n";

        let transcript = parse(content);
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].text, "Cue with identifier");
    }

    #[test]
    fn test_empty_text_after_stripping_dropped() {
        let content = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n<v Jane></v>\n";

        let transcript = parse(content);
        assert!(transcript.segments.is_empty());
    }

    #[test]
    fn test_non_monotonic_times_passed_through() {
        let content = "WEBVTT\n\n\
            00:00:10.000 --> 00:00:12.000\nLater cue first\n\n\
            00:00:01.000 --> 00:00:02.000\nEarlier cue second\n";

        let transcript = parse(content);
        assert_eq!(transcript.segments[0].start_time, 10.0);
        assert_eq!(transcript.segments[1].start_time, 1.0);
    }
}

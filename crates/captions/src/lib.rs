//! Reelsmith Captions
//!
//! Word-synchronized captions:
//! - **Transcript:** loading and timing repair of speech-to-text words
//! - **Segment:** grouping words into on-screen phrases
//! - **ASS:** karaoke track with a per-word highlight
//! - **SRT:** plain one-cue-per-phrase track
//! - **Estimate:** evenly spread timing when no transcript exists

pub mod ass;
pub mod estimate;
pub mod segment;
pub mod srt;
pub mod timestamp;
pub mod transcript;

use std::path::Path;

use reelsmith_common::ReelResult;
use reelsmith_project_model::style::CaptionStyle;
use reelsmith_project_model::transcript::{Phrase, TranscriptWord};

pub use ass::{generate_karaoke_ass, karaoke_events, KaraokeEvent};
pub use estimate::estimate_word_timing;
pub use segment::{segment_phrases, DEFAULT_MAX_WORDS};
pub use srt::generate_srt;
pub use timestamp::{format_ass_time, format_srt_time, parse_ass_time, parse_srt_time};
pub use transcript::{load_transcript, parse_transcript, sanitize_words, Sanitized};

/// Subtitle file flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Styled karaoke track.
    Ass,
    /// Plain timed text.
    Srt,
}

impl SubtitleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SubtitleFormat::Ass => "ass",
            SubtitleFormat::Srt => "srt",
        }
    }

    /// Pick the format from a file extension, defaulting to ASS.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("srt") => SubtitleFormat::Srt,
            _ => SubtitleFormat::Ass,
        }
    }
}

/// Where caption timing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingSource {
    Transcript,
    Estimated,
}

/// Phrases ready to be written in either format.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub phrases: Vec<Phrase>,
    pub source: TimingSource,
    /// Timing repairs made to the transcript.
    pub repairs: usize,
}

impl CaptionTrack {
    /// Build a track from the best timing available: transcript words,
    /// else the script spread over `audio_secs`. `None` when neither yields
    /// any words.
    pub fn build(
        transcript: Option<&[TranscriptWord]>,
        script: Option<&str>,
        audio_secs: f64,
        max_words: usize,
    ) -> Option<Self> {
        if let Some(words) = transcript {
            let sanitized = sanitize_words(words);
            if !sanitized.words.is_empty() {
                return Some(Self {
                    phrases: segment_phrases(&sanitized.words, max_words),
                    source: TimingSource::Transcript,
                    repairs: sanitized.repairs,
                });
            }
            tracing::warn!("Transcript has no usable words, falling back to estimated timing");
        }

        let estimated = estimate_word_timing(script.unwrap_or_default(), audio_secs);
        if estimated.is_empty() {
            return None;
        }
        Some(Self {
            phrases: segment_phrases(&estimated, max_words),
            source: TimingSource::Estimated,
            repairs: 0,
        })
    }

    pub fn render(&self, format: SubtitleFormat, style: &CaptionStyle, width: u32, height: u32) -> String {
        match format {
            SubtitleFormat::Ass => generate_karaoke_ass(&self.phrases, style, width, height),
            SubtitleFormat::Srt => generate_srt(&self.phrases),
        }
    }

    pub fn write(
        &self,
        path: &Path,
        format: SubtitleFormat,
        style: &CaptionStyle,
        width: u32,
        height: u32,
    ) -> ReelResult<()> {
        std::fs::write(path, self.render(format, style, width, height))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(SubtitleFormat::from_path(Path::new("a.SRT")), SubtitleFormat::Srt);
        assert_eq!(SubtitleFormat::from_path(Path::new("a.ass")), SubtitleFormat::Ass);
        assert_eq!(SubtitleFormat::from_path(Path::new("a")), SubtitleFormat::Ass);
    }

    #[test]
    fn test_build_prefers_transcript() {
        let words = vec![TranscriptWord::new("hi", 0.0, 0.5)];
        let track = CaptionTrack::build(Some(words.as_slice()), Some("ignored text"), 3.0, 4).unwrap();
        assert_eq!(track.source, TimingSource::Transcript);
        assert_eq!(track.phrases.len(), 1);
    }

    #[test]
    fn test_build_falls_back_to_estimate() {
        let empty = vec![TranscriptWord::new(" ", 0.0, 0.5)];
        let track = CaptionTrack::build(Some(empty.as_slice()), Some("one two three"), 3.0, 4).unwrap();
        assert_eq!(track.source, TimingSource::Estimated);
        assert_eq!(track.phrases[0].end, 3.0);

        assert!(CaptionTrack::build(None, None, 3.0, 4).is_none());
    }
}

//! Transcript loading and repair.

use std::path::Path;

use reelsmith_common::{ReelError, ReelResult};
use reelsmith_project_model::transcript::TranscriptWord;
use serde::Deserialize;

/// Transcripts arrive either as a bare word array or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Words(Vec<TranscriptWord>),
    Wrapped { words: Vec<TranscriptWord> },
}

/// Parse transcript JSON.
pub fn parse_transcript(json: &str) -> ReelResult<Vec<TranscriptWord>> {
    let file: TranscriptFile = serde_json::from_str(json)
        .map_err(|e| ReelError::caption(format!("unreadable transcript: {e}")))?;
    Ok(match file {
        TranscriptFile::Words(words) | TranscriptFile::Wrapped { words } => words,
    })
}

/// Read and parse a transcript file.
pub fn load_transcript(path: &Path) -> ReelResult<Vec<TranscriptWord>> {
    if !path.exists() {
        return Err(ReelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    parse_transcript(&std::fs::read_to_string(path)?)
}

/// Words after repair, plus how many repairs were made.
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    pub words: Vec<TranscriptWord>,
    pub repairs: usize,
}

/// Repair timing defects in a word list.
///
/// Empty tokens are dropped, a start earlier than the previous word's start
/// is raised to it, and an end before its start is raised to the start.
/// Nothing is ever reordered.
pub fn sanitize_words(words: &[TranscriptWord]) -> Sanitized {
    let mut repairs = 0;
    let mut out: Vec<TranscriptWord> = Vec::with_capacity(words.len());
    let mut floor = 0.0_f64;

    for word in words {
        let text = word.text.trim();
        if text.is_empty() {
            repairs += 1;
            continue;
        }

        let mut fixed = word.clone();
        fixed.text = text.to_string();

        if !fixed.start.is_finite() || fixed.start < floor {
            fixed.start = floor;
            repairs += 1;
        }
        if !fixed.end.is_finite() || fixed.end < fixed.start {
            fixed.end = fixed.start;
            repairs += 1;
        }

        floor = fixed.start;
        out.push(fixed);
    }

    if repairs > 0 {
        tracing::warn!(
            repairs,
            words_in = words.len(),
            words_out = out.len(),
            "Repaired transcript timing"
        );
    }

    Sanitized {
        words: out,
        repairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(text: &str, start: f64, end: f64) -> TranscriptWord {
        TranscriptWord::new(text, start, end)
    }

    #[test]
    fn test_clean_words_untouched() {
        let words = vec![w("a", 0.0, 0.3), w("b", 0.3, 0.6)];
        let result = sanitize_words(&words);
        assert_eq!(result.repairs, 0);
        assert_eq!(result.words, words);
    }

    #[test]
    fn test_repairs_are_counted() {
        let words = vec![
            w("one", 1.0, 1.4),
            w("   ", 1.4, 1.5),
            w("two", 0.8, 1.2),
            w("three", 1.5, 1.1),
        ];
        let result = sanitize_words(&words);
        assert_eq!(result.repairs, 3);
        assert_eq!(result.words.len(), 3);
        assert_eq!(result.words[1].start, 1.0);
        assert_eq!(result.words[1].end, 1.2);
        assert_eq!(result.words[2].end, 1.5);
    }

    #[test]
    fn test_parse_both_shapes() {
        let bare = r#"[{"word":"hi","start":0,"end":0.5}]"#;
        let wrapped = r#"{"words":[{"text":"hi","start":0,"end":0.5}]}"#;
        assert_eq!(parse_transcript(bare).unwrap(), parse_transcript(wrapped).unwrap());
        assert!(parse_transcript(r#"{"segments":[]}"#).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_transcript(Path::new("/nonexistent/transcript.json")).unwrap_err();
        assert!(matches!(err, ReelError::FileNotFound { .. }));
    }
}

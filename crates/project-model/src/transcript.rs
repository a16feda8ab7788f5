//! Timed words and display phrases.

use serde::{Deserialize, Serialize};

/// One word from the speech-to-text collaborator, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    #[serde(alias = "word")]
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TranscriptWord {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence: None,
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Word ends in punctuation that may close a phrase.
    pub fn ends_clause(&self) -> bool {
        self.text
            .trim_end()
            .ends_with(['.', '!', '?', ','])
    }
}

/// A group of consecutive words shown together on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub words: Vec<TranscriptWord>,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Phrase {
    /// Build a phrase spanning its first word's start to its last word's
    /// end. Returns `None` for an empty word list.
    pub fn from_words(words: Vec<TranscriptWord>) -> Option<Self> {
        let start = words.first()?.start;
        let end = words.last()?.end;
        let text = words
            .iter()
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ");
        Some(Self {
            words,
            text,
            start,
            end,
        })
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_alias_and_optional_confidence() {
        let json = r#"[{"word":"Hello","start":0.0,"end":0.4},
                       {"text":"there","start":0.4,"end":0.9,"confidence":0.93}]"#;
        let words: Vec<TranscriptWord> = serde_json::from_str(json).unwrap();
        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[0].confidence, None);
        assert_eq!(words[1].confidence, Some(0.93));
    }

    #[test]
    fn test_phrase_inherits_bounds() {
        let phrase = Phrase::from_words(vec![
            TranscriptWord::new("Hello", 0.0, 0.4),
            TranscriptWord::new("there", 0.4, 0.9),
            TranscriptWord::new("friend", 0.9, 1.5),
        ])
        .unwrap();
        assert_eq!(phrase.text, "Hello there friend");
        assert_eq!(phrase.start, 0.0);
        assert_eq!(phrase.end, 1.5);
    }

    #[test]
    fn test_empty_phrase_is_none() {
        assert!(Phrase::from_words(Vec::new()).is_none());
    }

    #[test]
    fn test_clause_punctuation() {
        assert!(TranscriptWord::new("done.", 0.0, 1.0).ends_clause());
        assert!(TranscriptWord::new("wait,", 0.0, 1.0).ends_clause());
        assert!(!TranscriptWord::new("and", 0.0, 1.0).ends_clause());
    }
}

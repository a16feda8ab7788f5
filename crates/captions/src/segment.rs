//! Phrase segmentation.

use reelsmith_project_model::transcript::{Phrase, TranscriptWord};

/// Default phrase length in words.
pub const DEFAULT_MAX_WORDS: usize = 4;

/// Group words into display phrases.
///
/// A phrase closes when it reaches `max_words`, or when a word ends in
/// `.`, `!`, `?` or `,` and the phrase already holds at least two words.
/// Every input word lands in exactly one phrase, in order.
pub fn segment_phrases(words: &[TranscriptWord], max_words: usize) -> Vec<Phrase> {
    let max_words = max_words.max(1);
    let mut phrases = Vec::new();
    let mut current: Vec<TranscriptWord> = Vec::with_capacity(max_words);

    for word in words {
        current.push(word.clone());
        let full = current.len() >= max_words;
        let clause_end = word.ends_clause() && current.len() >= 2;
        if full || clause_end {
            phrases.extend(Phrase::from_words(std::mem::take(&mut current)));
        }
    }
    phrases.extend(Phrase::from_words(current));

    phrases
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(texts: &[&str]) -> Vec<TranscriptWord> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptWord::new(*t, i as f64 * 0.5, i as f64 * 0.5 + 0.4))
            .collect()
    }

    fn texts(phrases: &[Phrase]) -> Vec<String> {
        phrases.iter().map(|p| p.text.clone()).collect()
    }

    #[test]
    fn test_single_short_phrase() {
        let input = vec![
            TranscriptWord::new("Hello", 0.0, 0.4),
            TranscriptWord::new("there", 0.4, 0.9),
            TranscriptWord::new("friend", 0.9, 1.5),
        ];
        let phrases = segment_phrases(&input, 4);
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].start, 0.0);
        assert_eq!(phrases[0].end, 1.5);
        assert_eq!(phrases[0].words.len(), 3);
    }

    #[test]
    fn test_closes_at_max_words() {
        let phrases = segment_phrases(&words(&["a", "b", "c", "d", "e", "f"]), 4);
        assert_eq!(texts(&phrases), vec!["a b c d", "e f"]);
    }

    #[test]
    fn test_punctuation_needs_two_words() {
        let phrases = segment_phrases(&words(&["Wait.", "This", "works,", "right?", "Yes"]), 4);
        assert_eq!(texts(&phrases), vec!["Wait. This works,", "right? Yes"]);
    }

    #[test]
    fn test_phrase_bounds_follow_words() {
        let phrases = segment_phrases(&words(&["one", "two", "three."]), 4);
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].start, 0.0);
        assert!((phrases[0].end - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_phrases(&[], 4).is_empty());
    }

    proptest! {
        #[test]
        fn prop_segmentation_is_total_and_deterministic(
            tokens in proptest::collection::vec("[a-z]{1,6}[.,!?]?", 0..60),
            max_words in 1usize..8,
        ) {
            let refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
            let input = words(&refs);
            let phrases = segment_phrases(&input, max_words);

            let flattened: Vec<TranscriptWord> =
                phrases.iter().flat_map(|p| p.words.clone()).collect();
            prop_assert_eq!(&flattened, &input);
            for phrase in &phrases {
                prop_assert!(!phrase.words.is_empty());
                prop_assert!(phrase.words.len() <= max_words);
            }
            prop_assert_eq!(segment_phrases(&input, max_words), phrases);
        }
    }
}

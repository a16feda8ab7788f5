//! Estimated word timing for when no transcript is available.

use reelsmith_project_model::transcript::TranscriptWord;

/// Spread the script's words evenly across `duration_secs`.
pub fn estimate_word_timing(script: &str, duration_secs: f64) -> Vec<TranscriptWord> {
    let tokens: Vec<&str> = script.split_whitespace().collect();
    if tokens.is_empty() || !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Vec::new();
    }

    let slot = duration_secs / tokens.len() as f64;
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, token)| {
            let start = i as f64 * slot;
            TranscriptWord {
                text: token.to_string(),
                start,
                end: start + slot,
                confidence: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_spread() {
        let words = estimate_word_timing("Ship small.  Ship often.", 2.0);
        assert_eq!(words.len(), 4);
        assert_eq!(words[1].text, "small.");
        assert_eq!(words[1].start, 0.5);
        assert_eq!(words[3].end, 2.0);
    }

    #[test]
    fn test_nothing_to_time() {
        assert!(estimate_word_timing("   ", 5.0).is_empty());
        assert!(estimate_word_timing("hello", 0.0).is_empty());
    }
}

//! Plain SRT output: one cue per phrase.

use reelsmith_project_model::transcript::Phrase;

use crate::timestamp::format_srt_time;

/// Generate SRT content from phrases.
pub fn generate_srt(phrases: &[Phrase]) -> String {
    let mut output = String::new();

    for (i, phrase) in phrases.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(phrase.start),
            format_srt_time(phrase.end),
        ));
        output.push_str(&phrase.text);
        output.push_str("\n\n");
    }

    output
}

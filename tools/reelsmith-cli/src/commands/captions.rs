//! Write a subtitle file from a transcript.

use std::path::PathBuf;

use reelsmith_captions::{load_transcript, CaptionTrack, SubtitleFormat};
use reelsmith_common::AppConfig;

use super::style_preset;

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    format: SubtitleFormat,
    style: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let style = style_preset(style)?;
    let words =
        load_transcript(&path).map_err(|e| anyhow::anyhow!("Failed to load transcript: {e}"))?;
    let audio_secs = words.iter().map(|w| w.end).fold(0.0, f64::max);

    let track = CaptionTrack::build(
        Some(words.as_slice()),
        None,
        audio_secs,
        config.pipeline.max_phrase_words,
    )
    .ok_or_else(|| anyhow::anyhow!("Transcript has no usable words"))?;

    let output = output.unwrap_or_else(|| path.with_extension(format.extension()));
    track
        .write(
            &output,
            format,
            &style,
            config.render.width,
            config.render.height,
        )
        .map_err(|e| anyhow::anyhow!("Failed to write captions: {e}"))?;

    println!("Captions written: {}", output.display());
    println!("  Phrases: {}", track.phrases.len());
    if track.repairs > 0 {
        println!("  Timing repairs: {}", track.repairs);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_srt_next_to_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.json");
        std::fs::write(
            &path,
            r#"[{"word": "Hello", "start": 0.0, "end": 0.4},
                {"word": "there.", "start": 0.4, "end": 0.9}]"#,
        )
        .unwrap();

        run(&AppConfig::default(), path, SubtitleFormat::Srt, "minimal", None).unwrap();

        let srt = std::fs::read_to_string(dir.path().join("talk.srt")).unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:00,900\nHello there.\n"));
    }
}

use std::path::PathBuf;

use reelsmith_captions::{
    load_transcript, parse_ass_time, CaptionTrack, SubtitleFormat, TimingSource,
};
use reelsmith_project_model::style::CaptionStyle;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-request")
        .join("transcript.json")
}

#[test]
fn fixture_transcript_is_repaired_and_segmented() {
    let words = load_transcript(&fixture_path()).expect("fixture transcript should load");
    let track = CaptionTrack::build(Some(words.as_slice()), None, 0.0, 4).unwrap();

    assert_eq!(track.source, TimingSource::Transcript);
    // Empty token, early start on "to", inverted end on "loops.".
    assert_eq!(track.repairs, 3);

    let texts: Vec<&str> = track.phrases.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Why do small teams", "out-ship big ones?", "It comes down to", "feedback loops."]
    );
}

#[test]
fn fixture_karaoke_events_never_go_backwards() {
    let words = load_transcript(&fixture_path()).unwrap();
    let track = CaptionTrack::build(Some(words.as_slice()), None, 0.0, 4).unwrap();
    let doc = track.render(SubtitleFormat::Ass, &CaptionStyle::minimal(), 1080, 1920);

    let mut last_start = 0.0;
    let mut events = 0;
    for line in doc.lines().filter(|l| l.starts_with("Dialogue: ")) {
        let fields: Vec<&str> = line.splitn(10, ',').collect();
        let start = parse_ass_time(fields[1]).unwrap();
        let end = parse_ass_time(fields[2]).unwrap();
        assert!(end >= start, "{line}");
        assert!(start >= last_start, "{line}");
        last_start = start;
        events += 1;
    }
    assert_eq!(events, 13);
}

#[test]
fn captions_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.srt");
    let words = load_transcript(&fixture_path()).unwrap();
    let track = CaptionTrack::build(Some(words.as_slice()), None, 0.0, 4).unwrap();
    track
        .write(&path, SubtitleFormat::from_path(&path), &CaptionStyle::default(), 1080, 1920)
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,050\nWhy do small teams\n\n"));
}

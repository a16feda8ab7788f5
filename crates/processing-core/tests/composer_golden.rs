use std::path::PathBuf;

use reelsmith_processing_core::crossfade::plan_crossfades;
use reelsmith_processing_core::timeline::{ComposeTarget, TimelineComposer};
use reelsmith_project_model::job::RenderRequest;

fn load_fixture_request() -> RenderRequest {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-request")
        .join("request.json");

    let content = std::fs::read_to_string(path).expect("fixture request should be readable");
    serde_json::from_str(&content).expect("fixture request should parse")
}

#[test]
fn fixture_request_orders_by_narrative_and_fills_gaps() {
    let request = load_fixture_request();
    let target = request.target_duration.expect("fixture sets a target");
    let timeline = TimelineComposer::with_defaults()
        .compose(&request.scenes, ComposeTarget::Fixed(target))
        .unwrap();

    let order: Vec<usize> = timeline.scenes.iter().map(|s| s.index()).collect();
    assert_eq!(order, vec![2, 4, 6, 5, 0, 7, 1, 3]);
    assert_eq!(timeline.filler_count(), 2);
    assert!(timeline.is_contiguous());
    assert!((timeline.total_duration() - 30.0).abs() < 1e-9);
    assert!((timeline.scenes[2].duration() - 5.25).abs() < 1e-9);
}

#[test]
fn fixture_request_audio_driven_matches_voiceover() {
    let request = load_fixture_request();
    let timeline = TimelineComposer::with_defaults()
        .compose(&request.scenes, ComposeTarget::AudioDriven(21.0))
        .unwrap();

    assert_eq!(timeline.len(), 6);
    assert_eq!(timeline.filler_count(), 0);
    assert!((timeline.total_duration() - 21.0).abs() < 1e-9);

    let plan = plan_crossfades(&timeline.durations(), 0.5).unwrap();
    assert_eq!(plan.offsets.len(), 5);
    assert!((plan.offsets[0] - 3.0).abs() < 1e-9);
    assert!((plan.output_duration - 18.5).abs() < 1e-9);
}

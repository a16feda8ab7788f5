//! Print the composed timeline for a request.

use std::path::PathBuf;

use reelsmith_common::AppConfig;
use reelsmith_project_model::timeline::TimedScene;
use reelsmith_render_engine::{plan_timeline, Toolchain};

use super::load_request;

pub async fn run(config: &AppConfig, path: PathBuf, audio_secs: Option<f64>) -> anyhow::Result<()> {
    let request = load_request(&path)?;

    let audio_secs = match (audio_secs, &request.voiceover) {
        (Some(secs), _) => Some(secs),
        (None, Some(voiceover)) => {
            let toolchain = Toolchain::from_config(&config.pipeline);
            let secs = toolchain
                .probe_duration(voiceover)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to probe voiceover (pass --audio-secs): {e}"))?;
            Some(secs)
        }
        (None, None) => None,
    };

    let timeline = plan_timeline(config, &request, audio_secs)
        .map_err(|e| anyhow::anyhow!("Failed to compose timeline: {e}"))?;

    println!("Timeline for: {}", path.display());
    if let Some(secs) = audio_secs {
        println!("  Voiceover: {secs:.2}s");
    }
    println!(
        "  Scenes: {} ({} filler)",
        timeline.len(),
        timeline.filler_count()
    );
    println!("  Total: {:.2}s", timeline.total_duration());
    println!();
    println!(
        "  {:>3}  {:>5}  {:<14} {:<7} {:>8} {:>8}  SOURCE",
        "#", "SCENE", "ANCHOR", "KIND", "START", "END"
    );
    for (position, timed) in timeline.scenes.iter().enumerate() {
        println!("{}", scene_row(position, timed));
    }

    Ok(())
}

fn scene_row(position: usize, timed: &TimedScene) -> String {
    let scene = &timed.scene;
    format!(
        "  {:>3}  {:>5}  {:<14} {:<7} {:>8.2} {:>8.2}  {}",
        position,
        scene.index,
        scene.anchor.as_str(),
        scene.kind.as_str(),
        timed.start,
        timed.end,
        scene.source.to_reference(),
    )
}

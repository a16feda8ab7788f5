//! Render a request and follow the job until it finishes.

use std::path::PathBuf;
use std::time::Duration;

use reelsmith_captions::load_transcript;
use reelsmith_common::AppConfig;
use reelsmith_render_engine::RenderOrchestrator;

use super::{load_request, style_preset};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run(
    mut config: AppConfig,
    request_path: PathBuf,
    output_dir: Option<PathBuf>,
    transcript: Option<PathBuf>,
    style: Option<String>,
    captions: bool,
) -> anyhow::Result<()> {
    let mut request = load_request(&request_path)?;
    if let Some(dir) = output_dir {
        config.paths.output_dir = dir;
    }
    if let Some(path) = transcript {
        request.transcript = Some(
            load_transcript(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load transcript: {e}"))?,
        );
    }
    if let Some(name) = style {
        request.caption_style = style_preset(&name)?;
    }
    if !captions {
        request.captions = false;
    }

    println!("Rendering request: {}", request_path.display());
    println!("  Scenes: {}", request.scenes.len());
    println!("  Voiceover: {}", match &request.voiceover {
        Some(path) => path.display().to_string(),
        None => "none".to_string(),
    });
    println!("  Sound effects: {}", request.sfx.len());

    tracing::debug!(
        output_dir = %config.paths.output_dir.display(),
        workers = config.pipeline.workers,
        "Submitting render job"
    );
    let orchestrator = RenderOrchestrator::new(config);
    let registry = orchestrator.registry();
    let id = orchestrator.submit(request);
    println!("  Job: {id}");

    let mut last_seen = None;
    let progress = loop {
        let progress = registry
            .snapshot(id)
            .ok_or_else(|| anyhow::anyhow!("Job {id} disappeared from the registry"))?;

        let state = (progress.status, progress.percent);
        if last_seen != Some(state) {
            println!("  [{:>3}%] {}", progress.percent, progress.status);
            last_seen = Some(state);
        }
        if progress.status.is_terminal() {
            break progress;
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("  Cancelling...");
                registry.cancel(id);
            }
        }
    };

    for degradation in &progress.degradations {
        println!("  [WARN] {}: {}", degradation.stage, degradation.reason);
    }
    println!("{}", serde_json::to_string_pretty(&progress)?);

    match (&progress.output_ref, &progress.error) {
        (Some(output), _) => {
            println!("\nRender complete: {}", output.display());
            Ok(())
        }
        (None, Some(error)) => Err(anyhow::anyhow!("Render failed: {error}")),
        (None, None) => Err(anyhow::anyhow!("Render ended without output")),
    }
}

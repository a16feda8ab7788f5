//! Render orchestration.
//!
//! One job walks `queued → composing → transitioning → reconciling_audio →
//! captioning → complete`, or drops to `failed` from any stage. A stage only
//! advances once its output exists and is non-empty. Scratch files live in
//! a per-job temporary directory that is removed however the job ends.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use reelsmith_captions::{CaptionTrack, SubtitleFormat, TimingSource};
use reelsmith_common::{AppConfig, ReelError, ReelResult};
use reelsmith_processing_core::timeline::{ComposeTarget, ComposerConfig, TimelineComposer};
use reelsmith_project_model::job::{JobId, JobProgress, RenderRequest, RenderStatus};
use reelsmith_project_model::timeline::Timeline;

use crate::audio::AudioReconciler;
use crate::burn::CaptionBurner;
use crate::compositor::Compositor;
use crate::fetch::AssetFetcher;
use crate::ffmpeg::{verify_output, Toolchain};
use crate::jobs::{JobHandle, JobRegistry};
use crate::normalize::{normalize_all, ClipProducer, FfmpegClipProducer};

/// Pacing for a request given the probed voiceover length.
pub fn compose_target(
    request: &RenderRequest,
    voiceover_secs: Option<f64>,
    default_target_secs: f64,
) -> ReelResult<ComposeTarget> {
    if request.audio_driven {
        let secs = voiceover_secs
            .ok_or_else(|| ReelError::invalid_input("audio-driven pacing needs a voiceover"))?;
        return Ok(ComposeTarget::AudioDriven(secs));
    }
    Ok(ComposeTarget::Fixed(
        request
            .target_duration
            .or(voiceover_secs)
            .unwrap_or(default_target_secs),
    ))
}

/// Compose the timeline a request would render, without rendering it.
pub fn plan_timeline(
    config: &AppConfig,
    request: &RenderRequest,
    voiceover_secs: Option<f64>,
) -> ReelResult<Timeline> {
    request
        .validate()
        .map_err(|e| ReelError::invalid_input(e.to_string()))?;
    let target = compose_target(request, voiceover_secs, config.pipeline.default_target_secs)?;
    TimelineComposer::new(ComposerConfig {
        gap_unit_secs: config.pipeline.gap_unit_secs,
    })
    .compose(&request.scenes, target)
}

/// Runs render jobs and tracks their progress.
#[derive(Clone)]
pub struct RenderOrchestrator {
    config: Arc<AppConfig>,
    toolchain: Arc<Toolchain>,
    registry: Arc<JobRegistry>,
    producer: Option<Arc<dyn ClipProducer>>,
}

impl RenderOrchestrator {
    pub fn new(config: AppConfig) -> Self {
        let toolchain = Toolchain::from_config(&config.pipeline);
        Self {
            config: Arc::new(config),
            toolchain: Arc::new(toolchain),
            registry: Arc::new(JobRegistry::new()),
            producer: None,
        }
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = Arc::new(toolchain);
        self
    }

    /// Normalize scenes with `producer` instead of fetching and encoding
    /// each source through ffmpeg.
    pub fn with_clip_producer(mut self, producer: Arc<dyn ClipProducer>) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Queue a job on the runtime and return its id for polling.
    pub fn submit(&self, request: RenderRequest) -> JobId {
        let handle = self.registry.create();
        let id = handle.id();
        let this = self.clone();
        tokio::spawn(async move {
            this.run_job(handle, request).await;
        });
        id
    }

    /// Run a job to completion on the current task.
    pub async fn render(&self, request: RenderRequest) -> JobProgress {
        let handle = self.registry.create();
        self.run_job(handle, request).await
    }

    /// Drive one job and record how it ended.
    pub async fn run_job(&self, handle: JobHandle, request: RenderRequest) -> JobProgress {
        let started = Instant::now();
        let output = self
            .config
            .paths
            .output_dir
            .join(format!("{}.mp4", handle.id()));

        tracing::info!(job_id = %handle.id(), scenes = request.scenes.len(), "Starting render job");

        match self.execute(&handle, &request, &output).await {
            Ok(()) => {
                tracing::info!(
                    job_id = %handle.id(),
                    output = %output.display(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    degradations = handle.snapshot().degradations.len(),
                    "Render job complete"
                );
                handle.complete(output);
            }
            Err(err) => {
                let cause = match err {
                    ReelError::Cancelled => "cancelled".to_string(),
                    other => other.to_string(),
                };
                tracing::error!(job_id = %handle.id(), %cause, "Render job failed");
                if output.exists() {
                    let _ = std::fs::remove_file(&output);
                }
                handle.fail(cause);
            }
        }

        handle.snapshot()
    }

    async fn execute(&self, handle: &JobHandle, request: &RenderRequest, output: &Path) -> ReelResult<()> {
        let config = &self.config;
        let toolchain = self.toolchain.as_ref();
        request
            .validate()
            .map_err(|e| ReelError::invalid_input(e.to_string()))?;

        std::fs::create_dir_all(&config.paths.work_dir)?;
        std::fs::create_dir_all(&config.paths.output_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("job-{}-", handle.id()))
            .tempdir_in(&config.paths.work_dir)?;
        let work = scratch.path();

        // Composing
        handle.set_status(RenderStatus::Composing);
        let voiceover_secs = match &request.voiceover {
            Some(path) => Some(
                toolchain
                    .probe_duration(path)
                    .await
                    .map_err(|e| ReelError::audio(format!("voiceover unreadable: {e}")))?,
            ),
            None => None,
        };
        let timeline = plan_timeline(config, request, voiceover_secs)?;

        let producer: Arc<dyn ClipProducer> = match &self.producer {
            Some(producer) => Arc::clone(producer),
            None => Arc::new(FfmpegClipProducer::new(
                Arc::clone(&self.toolchain),
                Arc::new(AssetFetcher::from_config(&config.pipeline)?),
                config.render.clone(),
                work,
            )),
        };
        let normalized = normalize_all(producer, &timeline, config.pipeline.workers, |done, total| {
            handle.set_percent(10 + (30 * done / total.max(1)) as u8);
        })
        .await?;
        for (scene_index, reason) in &normalized.dropped {
            handle.degrade(
                RenderStatus::Composing,
                format!("scene {scene_index} dropped: {reason}"),
            );
        }
        self.checkpoint(handle)?;

        // Transitioning
        handle.set_status(RenderStatus::Transitioning);
        let composite = Compositor::new(toolchain, &config.render, config.pipeline.crossfade_secs)
            .composite(&normalized.clips, &work.join("base.mp4"))
            .await?;
        if let Some(reason) = &composite.fallback_reason {
            handle.degrade(
                RenderStatus::Transitioning,
                format!("joined with hard cuts: {reason}"),
            );
        }
        verify_output(&composite.path)?;
        self.checkpoint(handle)?;

        // Reconciling audio
        handle.set_status(RenderStatus::ReconcilingAudio);
        let reconciler = AudioReconciler::new(toolchain, &config.render, config.pipeline.sfx_gain_db);
        let composed = work.join("composed.mp4");
        let mixed = work.join("mixed.m4a");
        let final_secs = match (&request.voiceover, voiceover_secs) {
            (Some(voiceover), Some(voiceover_secs)) => {
                let mix = reconciler
                    .mix_sfx(voiceover, voiceover_secs, &request.sfx, &mixed)
                    .await;
                if let Some(reason) = mix.fallback_reason {
                    handle.degrade(RenderStatus::ReconcilingAudio, format!("sfx skipped: {reason}"));
                }
                reconciler
                    .match_to_audio(&composite.path, &mix.path, voiceover_secs, &composed)
                    .await?;
                voiceover_secs
            }
            _ => {
                let audio = if request.sfx.is_empty() {
                    None
                } else {
                    match reconciler
                        .render_silence(composite.duration, &work.join("silence.m4a"))
                        .await
                    {
                        Ok(silence) => {
                            let mix = reconciler
                                .mix_sfx(&silence, composite.duration, &request.sfx, &mixed)
                                .await;
                            if let Some(reason) = mix.fallback_reason {
                                handle.degrade(
                                    RenderStatus::ReconcilingAudio,
                                    format!("sfx skipped: {reason}"),
                                );
                            }
                            Some(mix.path)
                        }
                        Err(err) => {
                            handle.degrade(
                                RenderStatus::ReconcilingAudio,
                                format!("sfx skipped: {err}"),
                            );
                            None
                        }
                    }
                };
                reconciler
                    .keep_natural(&composite.path, audio.as_deref(), &composed)
                    .await?;
                composite.duration
            }
        };
        self.checkpoint(handle)?;

        // Captioning
        handle.set_status(RenderStatus::Captioning);
        let burner = CaptionBurner::new(toolchain, &config.render);
        if !request.captions {
            burner.copy_through(&composed, output).await?;
            return Ok(());
        }

        let narration = request.narration_text();
        let track = CaptionTrack::build(
            request.transcript.as_deref(),
            Some(narration.as_str()),
            final_secs,
            config.pipeline.max_phrase_words,
        );
        let Some(track) = track else {
            handle.degrade(RenderStatus::Captioning, "no transcript or script to caption");
            burner.copy_through(&composed, output).await?;
            return Ok(());
        };

        if track.source == TimingSource::Estimated {
            handle.degrade(RenderStatus::Captioning, "no usable transcript, word timing estimated");
        }
        if track.repairs > 0 {
            tracing::info!(repairs = track.repairs, "Transcript timing repaired before captioning");
        }

        let subtitles = work.join("captions.ass");
        let burned = match track.write(
            &subtitles,
            SubtitleFormat::Ass,
            &request.caption_style,
            config.render.width,
            config.render.height,
        ) {
            Ok(()) => burner.burn(&composed, &subtitles, output).await,
            Err(err) => Err(err),
        };
        if let Err(err) = burned {
            handle.degrade(RenderStatus::Captioning, format!("captions not burned: {err}"));
            burner.copy_through(&composed, output).await?;
        }

        verify_output(output)?;
        Ok(())
    }

    fn checkpoint(&self, handle: &JobHandle) -> ReelResult<()> {
        if handle.is_cancelled() {
            tracing::info!(job_id = %handle.id(), "Stopping cancelled job");
            return Err(ReelError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedClip;
    use async_trait::async_trait;
    use reelsmith_project_model::job::Degradation;
    use reelsmith_project_model::scene::{AnchorType, Scene};
    use reelsmith_project_model::timeline::TimedScene;
    use std::path::PathBuf;

    /// Writes a placeholder clip per scene. Optionally cancels every job in
    /// `cancel_in` while producing.
    struct PlaceholderProducer {
        dir: PathBuf,
        cancel_in: Option<Arc<JobRegistry>>,
    }

    #[async_trait]
    impl ClipProducer for PlaceholderProducer {
        async fn produce(&self, position: usize, scene: &TimedScene) -> ReelResult<NormalizedClip> {
            if let Some(registry) = &self.cancel_in {
                for job in registry.list() {
                    registry.cancel(job.id);
                }
            }
            let local_path = self.dir.join(format!("clip_{position}.mp4"));
            tokio::fs::write(&local_path, b"placeholder clip").await?;
            Ok(NormalizedClip {
                position,
                scene_index: scene.scene.index,
                local_path,
                actual_duration: scene.duration(),
            })
        }
    }

    /// Stand-in ffmpeg/ffprobe pair. The ffmpeg script exits non-zero when
    /// any argument contains one of `fail_on`, and otherwise writes a few
    /// bytes to its last argument.
    #[cfg(unix)]
    fn stub_toolchain(dir: &Path, fail_on: &[&str]) -> Toolchain {
        use std::os::unix::fs::PermissionsExt;

        let mut script = String::from("#!/bin/sh\nout=\"\"\nfor arg in \"$@\"; do\n");
        for pattern in fail_on {
            script.push_str(&format!(
                "  case \"$arg\" in *{pattern}*) echo \"stub refuses {pattern}\" >&2; exit 1 ;; esac\n"
            ));
        }
        script.push_str("  out=\"$arg\"\ndone\nprintf 'stub-media' > \"$out\"\n");
        let probe = "#!/bin/sh\necho '{\"format\":{\"duration\":\"6.000\"}}'\n";

        let ffmpeg = dir.join("ffmpeg");
        let ffprobe = dir.join("ffprobe");
        for (path, body) in [(&ffmpeg, script.as_str()), (&ffprobe, probe)] {
            std::fs::write(path, body).unwrap();
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        Toolchain {
            ffmpeg,
            ffprobe,
            ..Toolchain::default()
        }
    }

    fn stages(degradations: &[Degradation]) -> Vec<&str> {
        degradations.iter().map(|d| d.stage.as_str()).collect()
    }

    fn request() -> RenderRequest {
        RenderRequest::new(vec![
            Scene::new(0, "a.mp4", AnchorType::Hook, 3.0).unwrap(),
            Scene::new(1, "b.mp4", AnchorType::Closer, 3.0).unwrap(),
        ])
    }

    fn test_config(root: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.paths.work_dir = root.join("work");
        config.paths.output_dir = root.join("renders");
        config
    }

    #[test]
    fn test_compose_target_selection() {
        let mut req = request();
        assert_eq!(compose_target(&req, None, 30.0).unwrap(), ComposeTarget::Fixed(30.0));
        assert_eq!(compose_target(&req, Some(12.0), 30.0).unwrap(), ComposeTarget::Fixed(12.0));

        req.target_duration = Some(20.0);
        assert_eq!(compose_target(&req, Some(12.0), 30.0).unwrap(), ComposeTarget::Fixed(20.0));

        req.audio_driven = true;
        assert_eq!(
            compose_target(&req, Some(12.0), 30.0).unwrap(),
            ComposeTarget::AudioDriven(12.0)
        );
        assert!(compose_target(&req, None, 30.0).is_err());
    }

    #[test]
    fn test_plan_timeline_rejects_empty_request() {
        let config = AppConfig::default();
        let empty = RenderRequest::new(Vec::new());
        assert!(matches!(
            plan_timeline(&config, &empty, None),
            Err(ReelError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_request_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let orchestrator = RenderOrchestrator::new(test_config(root.path()));

        let progress = orchestrator.render(RenderRequest::new(Vec::new())).await;
        assert_eq!(progress.status, RenderStatus::Failed);
        assert!(progress.error.unwrap().contains("scenes"));
        assert!(progress.output_ref.is_none());
    }

    #[tokio::test]
    async fn test_missing_voiceover_fails_without_scratch_leftovers() {
        let root = tempfile::tempdir().unwrap();
        let orchestrator = RenderOrchestrator::new(test_config(root.path()));
        let mut req = request();
        req.voiceover = Some(root.path().join("missing.mp3"));

        let progress = orchestrator.render(req).await;
        assert_eq!(progress.status, RenderStatus::Failed);
        assert!(progress.error.unwrap().contains("voiceover"));

        let leftovers = std::fs::read_dir(root.path().join("work")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_submitted_job_is_pollable() {
        let root = tempfile::tempdir().unwrap();
        let orchestrator = RenderOrchestrator::new(test_config(root.path()));
        let registry = orchestrator.registry();

        let id = orchestrator.submit(RenderRequest::new(Vec::new()));
        assert!(registry.snapshot(id).is_some());

        let mut snapshot = registry.snapshot(id).unwrap();
        for _ in 0..100 {
            if snapshot.status.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            snapshot = registry.snapshot(id).unwrap();
        }
        assert_eq!(snapshot.status, RenderStatus::Failed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_between_stages_fails_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let clips = tempfile::tempdir().unwrap();
        let orchestrator = RenderOrchestrator::new(test_config(root.path()))
            .with_toolchain(stub_toolchain(root.path(), &[]));
        let orchestrator = orchestrator.clone().with_clip_producer(Arc::new(PlaceholderProducer {
            dir: clips.path().to_path_buf(),
            cancel_in: Some(orchestrator.registry()),
        }));

        let mut req = request();
        req.target_duration = Some(6.0);
        let progress = orchestrator.render(req).await;

        assert_eq!(progress.status, RenderStatus::Failed);
        assert_eq!(progress.error.as_deref(), Some("cancelled"));
        assert!(progress.output_ref.is_none());
        assert_eq!(std::fs::read_dir(root.path().join("work")).unwrap().count(), 0);
        assert!(!root.path().join("renders").join(format!("{}.mp4", progress.id)).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_crossfade_falls_back_to_hard_cuts() {
        let root = tempfile::tempdir().unwrap();
        let clips = tempfile::tempdir().unwrap();
        let orchestrator = RenderOrchestrator::new(test_config(root.path()))
            .with_toolchain(stub_toolchain(root.path(), &["xfade="]))
            .with_clip_producer(Arc::new(PlaceholderProducer {
                dir: clips.path().to_path_buf(),
                cancel_in: None,
            }));

        let mut req = request();
        req.target_duration = Some(6.0);
        req.captions = false;
        let progress = orchestrator.render(req).await;

        assert_eq!(progress.status, RenderStatus::Complete, "{:?}", progress.error);
        assert_eq!(stages(&progress.degradations), vec!["transitioning"]);
        assert!(progress.degradations[0].reason.contains("hard cuts"));
        let output = progress.output_ref.unwrap();
        assert_eq!(output, root.path().join("renders").join(format!("{}.mp4", progress.id)));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "stub-media");
        assert_eq!(std::fs::read_dir(root.path().join("work")).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_burn_in_copies_video_through() {
        let root = tempfile::tempdir().unwrap();
        let clips = tempfile::tempdir().unwrap();
        let orchestrator = RenderOrchestrator::new(test_config(root.path()))
            .with_toolchain(stub_toolchain(root.path(), &["ass="]))
            .with_clip_producer(Arc::new(PlaceholderProducer {
                dir: clips.path().to_path_buf(),
                cancel_in: None,
            }));

        let mut req = request();
        req.target_duration = Some(6.0);
        req.captions = true;
        req.script = Some("hello there friend".to_string());
        let progress = orchestrator.render(req).await;

        assert_eq!(progress.status, RenderStatus::Complete, "{:?}", progress.error);
        assert!(stages(&progress.degradations).iter().all(|s| *s == "captioning"));
        assert!(progress
            .degradations
            .iter()
            .any(|d| d.reason.starts_with("captions not burned")));
        let output = progress.output_ref.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "stub-media");
    }
}

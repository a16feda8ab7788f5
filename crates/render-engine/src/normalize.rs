//! Asset normalization.
//!
//! Every timed scene becomes a clip in the fixed output profile, exactly as
//! long as its slot, with no audio. Scenes are produced in parallel by a
//! bounded pool; a scene that fails is dropped and its siblings carry on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reelsmith_common::{ReelError, ReelResult, RenderProfile};
use reelsmith_processing_core::motion::{zoompan_filter, MotionKind};
use reelsmith_project_model::scene::SceneKind;
use reelsmith_project_model::timeline::{TimedScene, Timeline};
use tokio::sync::{mpsc, Semaphore};

use crate::fetch::AssetFetcher;
use crate::ffmpeg::{verify_output, video_encode_args, Toolchain};

/// A scene rendered to the output profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedClip {
    /// Position on the timeline.
    pub position: usize,
    /// The scene's planner index.
    pub scene_index: usize,
    pub local_path: PathBuf,
    pub actual_duration: f64,
}

/// Produces one normalized clip per timed scene.
#[async_trait]
pub trait ClipProducer: Send + Sync {
    async fn produce(&self, position: usize, scene: &TimedScene) -> ReelResult<NormalizedClip>;
}

/// Outcome of normalizing a whole timeline.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    /// Clips in timeline order.
    pub clips: Vec<NormalizedClip>,
    /// Scenes that produced no clip: `(planner index, reason)`.
    pub dropped: Vec<(usize, String)>,
}

/// Normalize every scene with at most `workers` in flight.
///
/// `on_progress(done, total)` runs after each scene finishes, in completion
/// order. Results come back in timeline order regardless.
pub async fn normalize_all(
    producer: Arc<dyn ClipProducer>,
    timeline: &Timeline,
    workers: usize,
    mut on_progress: impl FnMut(usize, usize),
) -> ReelResult<NormalizeOutcome> {
    let total = timeline.len();
    if total == 0 {
        return Err(ReelError::normalize("timeline has no scenes"));
    }

    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let (tx, mut rx) = mpsc::channel::<(usize, ReelResult<NormalizedClip>)>(total);

    for (position, timed) in timeline.scenes.iter().cloned().enumerate() {
        let producer = Arc::clone(&producer);
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => producer.produce(position, &timed).await,
                Err(_) => Err(ReelError::normalize("worker pool closed")),
            };
            // Receiver gone means the run was abandoned.
            let _ = tx.send((position, result)).await;
        });
    }
    drop(tx);

    let mut finished: BTreeMap<usize, NormalizedClip> = BTreeMap::new();
    let mut dropped = Vec::new();
    let mut done = 0;

    while let Some((position, result)) = rx.recv().await {
        done += 1;
        let scene_index = timeline.scenes[position].index();
        match result {
            Ok(clip) => {
                finished.insert(position, clip);
            }
            Err(err) => {
                tracing::warn!(
                    position,
                    scene_index,
                    error = %err,
                    "Dropping scene that failed to normalize"
                );
                dropped.push((scene_index, err.to_string()));
            }
        }
        on_progress(done, total);
    }

    // A panicked task never reports; count it as dropped.
    for (position, timed) in timeline.scenes.iter().enumerate() {
        let reported = finished.contains_key(&position)
            || dropped.iter().any(|(index, _)| *index == timed.index());
        if !reported {
            dropped.push((timed.index(), "worker task aborted".to_string()));
        }
    }

    if finished.is_empty() {
        return Err(ReelError::normalize(format!(
            "all {total} scenes failed to normalize"
        )));
    }

    Ok(NormalizeOutcome {
        clips: finished.into_values().collect(),
        dropped,
    })
}

/// Clip producer backed by the asset fetcher and ffmpeg.
pub struct FfmpegClipProducer {
    toolchain: Arc<Toolchain>,
    fetcher: Arc<AssetFetcher>,
    profile: RenderProfile,
    scratch: PathBuf,
}

impl FfmpegClipProducer {
    pub fn new(
        toolchain: Arc<Toolchain>,
        fetcher: Arc<AssetFetcher>,
        profile: RenderProfile,
        scratch: &Path,
    ) -> Self {
        Self {
            toolchain,
            fetcher,
            profile,
            scratch: scratch.to_path_buf(),
        }
    }

    fn output_args(&self, duration: f64, output: &Path) -> Vec<String> {
        let mut args = vec!["-t".to_string(), format!("{duration:.3}"), "-an".to_string()];
        args.extend(video_encode_args(&self.profile));
        args.push(output.to_string_lossy().into_owned());
        args
    }

    fn image_args(&self, source: &Path, scene: &TimedScene, output: &Path) -> Vec<String> {
        let p = &self.profile;
        let motion = MotionKind::choose(scene.scene.direction_hint.as_deref(), scene.index());
        // Oversample before zoompan so sub-pixel moves do not jitter.
        let (w2, h2) = (p.width * 2, p.height * 2);
        let filter = format!(
            "scale={w2}:{h2}:force_original_aspect_ratio=increase,crop={w2}:{h2},{},setsar=1,format=yuv420p",
            zoompan_filter(motion, scene.duration(), p.width, p.height, p.fps)
        );

        let mut args = vec![
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-vf".to_string(),
            filter,
        ];
        args.extend(self.output_args(scene.duration(), output));
        args
    }

    fn clip_args(&self, source: &Path, scene: &TimedScene, output: &Path) -> Vec<String> {
        let p = &self.profile;
        let filter = format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p",
            w = p.width,
            h = p.height,
            fps = p.fps
        );

        // Looping the input guarantees a short source still fills its slot.
        let mut args = vec![
            "-stream_loop".to_string(),
            "-1".to_string(),
            "-ss".to_string(),
            "0".to_string(),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-vf".to_string(),
            filter,
        ];
        args.extend(self.output_args(scene.duration(), output));
        args
    }

    fn filler_args(&self, scene: &TimedScene, output: &Path, gradient: bool) -> Vec<String> {
        let p = &self.profile;
        let duration = scene.duration();
        let source = if gradient {
            format!(
                "gradients=s={}x{}:d={duration:.3}:r={}:c0=0x1b1f3a:c1=0x3b2f63:speed=0.008",
                p.width, p.height, p.fps
            )
        } else {
            format!("color=c=0x1b1f3a:s={}x{}:d={duration:.3}:r={}", p.width, p.height, p.fps)
        };

        let mut args = vec![
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            source,
            "-vf".to_string(),
            "format=yuv420p".to_string(),
        ];
        args.extend(self.output_args(duration, output));
        args
    }
}

#[async_trait]
impl ClipProducer for FfmpegClipProducer {
    async fn produce(&self, position: usize, scene: &TimedScene) -> ReelResult<NormalizedClip> {
        let output = self.scratch.join(format!("clip_{position:03}.mp4"));
        let what = format!("normalize scene {}", scene.index());

        match scene.scene.kind {
            SceneKind::Filler => {
                if let Err(err) = self
                    .toolchain
                    .run_ffmpeg(&what, &self.filler_args(scene, &output, true))
                    .await
                {
                    tracing::debug!(error = %err, "Gradient source unavailable, using solid filler");
                    self.toolchain
                        .run_ffmpeg(&what, &self.filler_args(scene, &output, false))
                        .await?;
                }
            }
            SceneKind::Image | SceneKind::Clip => {
                let source = self
                    .fetcher
                    .resolve(&scene.scene.source, &self.scratch, &format!("src_{position:03}"))
                    .await?;
                let args = if scene.scene.kind == SceneKind::Image {
                    self.image_args(&source, scene, &output)
                } else {
                    self.clip_args(&source, scene, &output)
                };
                self.toolchain.run_ffmpeg(&what, &args).await?;
            }
        }

        verify_output(&output).map_err(|e| ReelError::normalize(format!("{what}: {e}")))?;
        let actual_duration = match self.toolchain.probe_duration(&output).await {
            Ok(secs) => secs,
            Err(err) => {
                tracing::debug!(error = %err, "Probe failed, assuming planned duration");
                scene.duration()
            }
        };

        tracing::debug!(
            position,
            scene_index = scene.index(),
            kind = scene.scene.kind.as_str(),
            actual_duration,
            "Scene normalized"
        );

        Ok(NormalizedClip {
            position,
            scene_index: scene.index(),
            local_path: output,
            actual_duration,
        })
    }
}

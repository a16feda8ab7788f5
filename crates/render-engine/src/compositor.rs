//! Transition compositor: joins normalized clips into one base video.
//!
//! Clips are joined with an `xfade` chain. If that fails the same sequence
//! is joined with hard cuts, and the fallback is reported so the job can
//! record reduced fidelity.

use std::path::{Path, PathBuf};

use reelsmith_common::{ReelError, ReelResult, RenderProfile};
use reelsmith_processing_core::crossfade::{plan_crossfades, CrossfadePlan};

use crate::ffmpeg::{verify_output, video_encode_args, Toolchain};
use crate::normalize::NormalizedClip;

/// How the clips ended up joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMethod {
    /// A single clip, used as is.
    Passthrough,
    Crossfade,
    /// Hard cuts after the crossfade attempt failed.
    HardCut,
}

/// The joined base video.
#[derive(Debug, Clone)]
pub struct CompositeOutcome {
    pub path: PathBuf,
    pub method: JoinMethod,
    /// Expected duration of the joined video.
    pub duration: f64,
    /// Why the crossfade was abandoned, if it was.
    pub fallback_reason: Option<String>,
}

/// Builds the `filter_complex` for an xfade chain over `n` video inputs.
pub fn build_xfade_filter(plan: &CrossfadePlan) -> String {
    let n = plan.offsets.len() + 1;
    let mut parts = Vec::with_capacity(n);
    let mut previous = "[0:v]".to_string();

    for (i, offset) in plan.offsets.iter().enumerate() {
        let next = i + 1;
        let label = if next == n - 1 {
            "[vout]".to_string()
        } else {
            format!("[x{next}]")
        };
        parts.push(format!(
            "{previous}[{next}:v]xfade=transition=fade:duration={:.3}:offset={offset:.3}{label}",
            plan.transition
        ));
        previous = label;
    }

    parts.join(";")
}

/// Builds the `filter_complex` for a hard-cut concat of `n` video inputs.
pub fn build_concat_filter(n: usize) -> String {
    let inputs: String = (0..n).map(|i| format!("[{i}:v]")).collect();
    format!("{inputs}concat=n={n}:v=1:a=0[vout]")
}

pub struct Compositor<'a> {
    toolchain: &'a Toolchain,
    profile: &'a RenderProfile,
    crossfade_secs: f64,
}

impl<'a> Compositor<'a> {
    pub fn new(toolchain: &'a Toolchain, profile: &'a RenderProfile, crossfade_secs: f64) -> Self {
        Self {
            toolchain,
            profile,
            crossfade_secs,
        }
    }

    /// Join `clips` (already in timeline order) into `output`.
    pub async fn composite(&self, clips: &[NormalizedClip], output: &Path) -> ReelResult<CompositeOutcome> {
        let durations: Vec<f64> = clips.iter().map(|c| c.actual_duration).collect();

        let Some(plan) = plan_crossfades(&durations, self.crossfade_secs) else {
            let only = clips
                .first()
                .ok_or_else(|| ReelError::composite("no clips to join"))?;
            tracing::debug!("Single clip, skipping transitions");
            return Ok(CompositeOutcome {
                path: only.local_path.clone(),
                method: JoinMethod::Passthrough,
                duration: only.actual_duration,
                fallback_reason: None,
            });
        };

        let xfade = self
            .run_join(clips, &build_xfade_filter(&plan), output, "crossfade")
            .await;
        let xfade_err = match xfade {
            Ok(()) => {
                tracing::info!(
                    clips = clips.len(),
                    transition_secs = plan.transition,
                    duration_secs = plan.output_duration,
                    "Joined clips with crossfades"
                );
                return Ok(CompositeOutcome {
                    path: output.to_path_buf(),
                    method: JoinMethod::Crossfade,
                    duration: plan.output_duration,
                    fallback_reason: None,
                });
            }
            Err(err) => err,
        };

        tracing::warn!(error = %xfade_err, "Crossfade join failed, falling back to hard cuts");
        self.run_join(clips, &build_concat_filter(clips.len()), output, "concat")
            .await
            .map_err(|concat_err| {
                ReelError::composite(format!(
                    "crossfade failed ({xfade_err}); hard-cut fallback failed ({concat_err})"
                ))
            })?;

        Ok(CompositeOutcome {
            path: output.to_path_buf(),
            method: JoinMethod::HardCut,
            duration: durations.iter().sum(),
            fallback_reason: Some(xfade_err.to_string()),
        })
    }

    async fn run_join(
        &self,
        clips: &[NormalizedClip],
        filter: &str,
        output: &Path,
        what: &str,
    ) -> ReelResult<()> {
        let mut args = Vec::with_capacity(clips.len() * 2 + 16);
        for clip in clips {
            args.push("-i".to_string());
            args.push(clip.local_path.to_string_lossy().into_owned());
        }
        args.extend([
            "-filter_complex".to_string(),
            filter.to_string(),
            "-map".to_string(),
            "[vout]".to_string(),
            "-an".to_string(),
        ]);
        args.extend(video_encode_args(self.profile));
        args.push(output.to_string_lossy().into_owned());

        self.toolchain.run_ffmpeg(what, &args).await?;
        verify_output(output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xfade_filter_chain() {
        let plan = plan_crossfades(&[4.0, 5.0, 6.0], 0.5).unwrap();
        assert_eq!(
            build_xfade_filter(&plan),
            "[0:v][1:v]xfade=transition=fade:duration=0.500:offset=3.500[x1];\
             [x1][2:v]xfade=transition=fade:duration=0.500:offset=8.000[vout]"
        );
    }

    #[test]
    fn test_xfade_filter_two_clips() {
        let plan = plan_crossfades(&[2.0, 2.0], 0.5).unwrap();
        assert_eq!(
            build_xfade_filter(&plan),
            "[0:v][1:v]xfade=transition=fade:duration=0.500:offset=1.500[vout]"
        );
    }

    #[test]
    fn test_concat_filter() {
        assert_eq!(build_concat_filter(3), "[0:v][1:v][2:v]concat=n=3:v=1:a=0[vout]");
    }

    #[tokio::test]
    async fn test_single_clip_passthrough() {
        let toolchain = Toolchain::default();
        let profile = RenderProfile::default();
        let compositor = Compositor::new(&toolchain, &profile, 0.5);
        let clip = NormalizedClip {
            position: 0,
            scene_index: 3,
            local_path: PathBuf::from("/scratch/clip_000.mp4"),
            actual_duration: 4.0,
        };
        let outcome = compositor
            .composite(std::slice::from_ref(&clip), Path::new("/scratch/base.mp4"))
            .await
            .unwrap();
        assert_eq!(outcome.method, JoinMethod::Passthrough);
        assert_eq!(outcome.path, clip.local_path);
        assert_eq!(outcome.duration, 4.0);
    }

    #[tokio::test]
    async fn test_no_clips_is_error() {
        let toolchain = Toolchain::default();
        let profile = RenderProfile::default();
        let result = Compositor::new(&toolchain, &profile, 0.5)
            .composite(&[], Path::new("/scratch/base.mp4"))
            .await;
        assert!(matches!(result, Err(ReelError::Composite { .. })));
    }
}

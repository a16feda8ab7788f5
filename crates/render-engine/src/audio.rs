//! Audio reconciliation: sound-effect mixing and duration matching.

use std::path::{Path, PathBuf};

use reelsmith_common::{ReelError, ReelResult, RenderProfile};
use reelsmith_processing_core::sfx::{place_effects, PlacedSfx};
use reelsmith_project_model::job::SfxRequest;

use crate::ffmpeg::{audio_encode_args, verify_output, video_encode_args, Toolchain};

/// Result of the effect mix.
#[derive(Debug, Clone, PartialEq)]
pub struct MixOutcome {
    /// Audio to use downstream; the input itself when nothing was mixed.
    pub path: PathBuf,
    pub mixed: usize,
    /// Why the mix was abandoned, if it was.
    pub fallback_reason: Option<String>,
}

/// lavfi source synthesizing a catalog effect.
pub fn sfx_source(effect: &str, duration: f64, sample_rate: u32) -> Option<String> {
    let d = format!("{duration:.3}");
    let half = format!("{:.3}", duration / 2.0);
    let source = match effect {
        "whoosh" => format!(
            "anoisesrc=color=pink:amplitude=0.6:duration={d}:sample_rate={sample_rate},\
             highpass=f=500,afade=t=in:st=0:d={half},afade=t=out:st={half}:d={half}"
        ),
        "pop" => format!(
            "sine=frequency=880:duration={d}:sample_rate={sample_rate},afade=t=out:st=0:d={d}"
        ),
        "riser" => format!(
            "aevalsrc=exprs='0.4*sin(2*PI*(220+660*t/{d})*t)':duration={d}:sample_rate={sample_rate},\
             afade=t=in:st=0:d={d}"
        ),
        "impact" => format!(
            "anoisesrc=color=brown:amplitude=0.9:duration={d}:sample_rate={sample_rate},\
             lowpass=f=160,afade=t=out:st=0:d={d}"
        ),
        "ding" => format!(
            "sine=frequency=1320:duration={d}:sample_rate={sample_rate},afade=t=out:st=0:d={d}"
        ),
        _ => return None,
    };
    Some(source)
}

/// `filter_complex` delaying each effect input to its slot and mixing all
/// of them over input 0.
pub fn build_mix_filter(placed: &[PlacedSfx], gain_db: f64) -> String {
    let mut parts = Vec::with_capacity(placed.len() + 1);
    let mut labels = String::from("[0:a]");
    for (i, sfx) in placed.iter().enumerate() {
        let input = i + 1;
        let ms = sfx.delay_ms();
        parts.push(format!(
            "[{input}:a]volume={gain_db:.1}dB,adelay={ms}|{ms}[s{input}]"
        ));
        labels.push_str(&format!("[s{input}]"));
    }
    parts.push(format!(
        "{labels}amix=inputs={}:duration=first:dropout_transition=0:normalize=0[aout]",
        placed.len() + 1
    ));
    parts.join(";")
}

pub struct AudioReconciler<'a> {
    toolchain: &'a Toolchain,
    profile: &'a RenderProfile,
    sfx_gain_db: f64,
}

impl<'a> AudioReconciler<'a> {
    pub fn new(toolchain: &'a Toolchain, profile: &'a RenderProfile, sfx_gain_db: f64) -> Self {
        Self {
            toolchain,
            profile,
            sfx_gain_db,
        }
    }

    /// Overlay effects on `base`, which is `total_secs` long.
    ///
    /// With no requests, or none the catalog knows, `base` is returned as
    /// is. A failed mix also returns `base`, with the reason.
    pub async fn mix_sfx(
        &self,
        base: &Path,
        total_secs: f64,
        requests: &[SfxRequest],
        output: &Path,
    ) -> MixOutcome {
        let unchanged = |reason: Option<String>| MixOutcome {
            path: base.to_path_buf(),
            mixed: 0,
            fallback_reason: reason,
        };

        if requests.is_empty() {
            return unchanged(None);
        }
        let placed = place_effects(requests, total_secs);
        if placed.is_empty() {
            return unchanged(None);
        }

        let mut args = vec!["-i".to_string(), base.to_string_lossy().into_owned()];
        for sfx in &placed {
            // place_effects only keeps catalog effects.
            let Some(source) = sfx_source(&sfx.effect_type, sfx.duration, self.profile.audio_sample_rate)
            else {
                continue;
            };
            args.extend(["-f".to_string(), "lavfi".to_string(), "-i".to_string(), source]);
        }
        args.extend([
            "-filter_complex".to_string(),
            build_mix_filter(&placed, self.sfx_gain_db),
            "-map".to_string(),
            "[aout]".to_string(),
        ]);
        args.extend(audio_encode_args(self.profile));
        args.push(output.to_string_lossy().into_owned());

        let result = match self.toolchain.run_ffmpeg("sfx mix", &args).await {
            Ok(()) => verify_output(output).map(|_| ()),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                tracing::info!(effects = placed.len(), "Mixed sound effects");
                MixOutcome {
                    path: output.to_path_buf(),
                    mixed: placed.len(),
                    fallback_reason: None,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "Sound-effect mix failed, keeping unmixed audio");
                unchanged(Some(err.to_string()))
            }
        }
    }

    /// Silent track `duration_secs` long, used as the mix base when there
    /// is no voiceover.
    pub async fn render_silence(&self, duration_secs: f64, output: &Path) -> ReelResult<PathBuf> {
        let mut args = vec![
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!("anullsrc=r={}:cl=stereo", self.profile.audio_sample_rate),
            "-t".to_string(),
            format!("{duration_secs:.3}"),
        ];
        args.extend(audio_encode_args(self.profile));
        args.push(output.to_string_lossy().into_owned());

        self.toolchain
            .run_ffmpeg("silence", &args)
            .await
            .map_err(|e| ReelError::audio(e.to_string()))?;
        verify_output(output)?;
        Ok(output.to_path_buf())
    }

    /// Mux `audio` under `video` so the result is exactly `audio_secs`
    /// long: the video loops when shorter and is cut when longer.
    pub async fn match_to_audio(
        &self,
        video: &Path,
        audio: &Path,
        audio_secs: f64,
        output: &Path,
    ) -> ReelResult<()> {
        let mut args = vec![
            "-stream_loop".to_string(),
            "-1".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-i".to_string(),
            audio.to_string_lossy().into_owned(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-t".to_string(),
            format!("{audio_secs:.3}"),
        ];
        args.extend(video_encode_args(self.profile));
        args.extend(audio_encode_args(self.profile));
        args.push(output.to_string_lossy().into_owned());

        self.toolchain
            .run_ffmpeg("duration match", &args)
            .await
            .map_err(|e| ReelError::audio(e.to_string()))?;
        verify_output(output)?;
        Ok(())
    }

    /// Keep the video's natural length; attach `audio` if there is one.
    pub async fn keep_natural(
        &self,
        video: &Path,
        audio: Option<&Path>,
        output: &Path,
    ) -> ReelResult<()> {
        let mut args = vec!["-i".to_string(), video.to_string_lossy().into_owned()];
        match audio {
            Some(audio) => {
                args.extend([
                    "-i".to_string(),
                    audio.to_string_lossy().into_owned(),
                    "-map".to_string(),
                    "0:v:0".to_string(),
                    "-map".to_string(),
                    "1:a:0".to_string(),
                    "-c:v".to_string(),
                    "copy".to_string(),
                    "-shortest".to_string(),
                ]);
                args.extend(audio_encode_args(self.profile));
            }
            None => args.extend(["-c".to_string(), "copy".to_string()]),
        }
        args.push(output.to_string_lossy().into_owned());

        self.toolchain
            .run_ffmpeg("attach audio", &args)
            .await
            .map_err(|e| ReelError::audio(e.to_string()))?;
        verify_output(output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sources() {
        for effect in reelsmith_project_model::job::SFX_CATALOG {
            let source = sfx_source(effect, 0.8, 44_100).unwrap();
            assert!(source.contains("0.800"), "{effect}: {source}");
            assert!(source.contains("44100"), "{effect}: {source}");
        }
        assert!(sfx_source("kazoo", 1.0, 44_100).is_none());
    }

    #[test]
    fn test_mix_filter() {
        let placed = vec![
            PlacedSfx {
                effect_type: "whoosh".to_string(),
                start: 0.0,
                duration: 0.6,
            },
            PlacedSfx {
                effect_type: "ding".to_string(),
                start: 11.5,
                duration: 0.5,
            },
        ];
        assert_eq!(
            build_mix_filter(&placed, -6.0),
            "[1:a]volume=-6.0dB,adelay=0|0[s1];\
             [2:a]volume=-6.0dB,adelay=11500|11500[s2];\
             [0:a][s1][s2]amix=inputs=3:duration=first:dropout_transition=0:normalize=0[aout]"
        );
    }

    #[tokio::test]
    async fn test_zero_requests_returns_input() {
        let toolchain = Toolchain::default();
        let profile = RenderProfile::default();
        let reconciler = AudioReconciler::new(&toolchain, &profile, -6.0);
        let voiceover = Path::new("/scratch/voiceover.mp3");

        let outcome = reconciler
            .mix_sfx(voiceover, 12.0, &[], Path::new("/scratch/mixed.m4a"))
            .await;
        assert_eq!(outcome.path, voiceover);
        assert_eq!(outcome.mixed, 0);
        assert!(outcome.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn test_unknown_only_returns_input() {
        let toolchain = Toolchain::default();
        let profile = RenderProfile::default();
        let reconciler = AudioReconciler::new(&toolchain, &profile, -6.0);
        let voiceover = Path::new("/scratch/voiceover.mp3");
        let requests = vec![SfxRequest::new("kazoo", 1.0, 0.5).unwrap()];

        let outcome = reconciler
            .mix_sfx(voiceover, 12.0, &requests, Path::new("/scratch/mixed.m4a"))
            .await;
        assert_eq!(outcome.path, voiceover);
    }
}

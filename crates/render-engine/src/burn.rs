//! Caption burn-in.

use std::path::Path;

use reelsmith_captions::SubtitleFormat;
use reelsmith_common::{ReelError, ReelResult, RenderProfile};

use crate::ffmpeg::{escape_filter_path, verify_output, video_encode_args, Toolchain};

/// Video filter rendering a subtitle file onto the frame.
pub fn burn_filter(subtitles: &Path, format: SubtitleFormat) -> String {
    let path = escape_filter_path(subtitles);
    match format {
        SubtitleFormat::Ass => format!("ass={path}"),
        SubtitleFormat::Srt => format!("subtitles={path}"),
    }
}

pub struct CaptionBurner<'a> {
    toolchain: &'a Toolchain,
    profile: &'a RenderProfile,
}

impl<'a> CaptionBurner<'a> {
    pub fn new(toolchain: &'a Toolchain, profile: &'a RenderProfile) -> Self {
        Self { toolchain, profile }
    }

    /// Re-encode `video` with `subtitles` drawn in. Audio is copied.
    pub async fn burn(&self, video: &Path, subtitles: &Path, output: &Path) -> ReelResult<()> {
        let mut args = vec![
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-vf".to_string(),
            burn_filter(subtitles, SubtitleFormat::from_path(subtitles)),
        ];
        args.extend(video_encode_args(self.profile));
        args.extend([
            "-c:a".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.to_string_lossy().into_owned(),
        ]);

        self.toolchain
            .run_ffmpeg("caption burn-in", &args)
            .await
            .map_err(|e| ReelError::caption(e.to_string()))?;
        verify_output(output)?;
        Ok(())
    }

    /// Copy `video` to `output` unchanged.
    pub async fn copy_through(&self, video: &Path, output: &Path) -> ReelResult<()> {
        tokio::fs::copy(video, output).await?;
        verify_output(output)?;
        Ok(())
    }
}

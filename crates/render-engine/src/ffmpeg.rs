//! Encode/decode/probe toolchain runner.
//!
//! Every invocation is bounded by a timeout, killed when the timeout fires,
//! and has its stderr captured so failures carry the tool's own diagnosis.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use reelsmith_common::{PipelineConfig, ReelError, ReelResult, RenderProfile};
use serde::Deserialize;
use tokio::process::Command;

/// Lines of stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 12;

/// Handle on the external ffmpeg/ffprobe binaries.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub process_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

impl Toolchain {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            process_timeout: Duration::from_secs(config.process_timeout_secs.max(1)),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs.max(1)),
        }
    }

    /// Both binaries resolve on `PATH`.
    pub fn is_available(&self) -> bool {
        command_exists(&self.ffmpeg.to_string_lossy()) && command_exists(&self.ffprobe.to_string_lossy())
    }

    /// Run ffmpeg with `args`, overwriting outputs. `what` names the
    /// operation in logs and errors.
    pub async fn run_ffmpeg(&self, what: &str, args: &[String]) -> ReelResult<()> {
        tracing::debug!(what, args = ?args, "Running ffmpeg");
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-y", "-loglevel", "error"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let child = cmd
            .spawn()
            .map_err(|e| ReelError::render(format!("failed to start ffmpeg for {what}: {e}")))?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.process_timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| ReelError::render(format!("failed to wait on ffmpeg for {what}: {e}")))?,
            Err(_) => {
                tracing::warn!(what, timeout_secs = self.process_timeout.as_secs(), "ffmpeg timed out");
                return Err(ReelError::timeout(
                    format!("ffmpeg {what}"),
                    self.process_timeout.as_secs_f64(),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::render(format!(
                "ffmpeg {what} failed ({}): {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }

        tracing::debug!(
            what,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ffmpeg finished"
        );
        Ok(())
    }

    /// Container duration in seconds.
    pub async fn probe_duration(&self, path: &Path) -> ReelResult<f64> {
        if !path.exists() {
            return Err(ReelError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.probe_timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| ReelError::render(format!("failed to run ffprobe: {e}")))?,
            Err(_) => {
                return Err(ReelError::timeout(
                    format!("ffprobe {}", path.display()),
                    self.probe_timeout.as_secs_f64(),
                ))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::render(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                stderr_tail(&stderr)
            )));
        }

        parse_probe_duration(&output.stdout).ok_or_else(|| {
            ReelError::render(format!("ffprobe reported no duration for {}", path.display()))
        })
    }

    /// Whether this ffmpeg build ships the named filter.
    pub async fn has_filter(&self, name: &str) -> bool {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-filters"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.probe_timeout, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                filter_listed(&String::from_utf8_lossy(&output.stdout), name)
            }
            _ => false,
        }
    }
}

/// Video encoder arguments for the fixed output profile.
pub fn video_encode_args(profile: &RenderProfile) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        profile.video_codec.clone(),
        "-preset".to_string(),
        profile.preset.clone(),
        "-crf".to_string(),
        profile.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        profile.fps.to_string(),
    ]
}

/// Audio encoder arguments for the fixed output profile.
pub fn audio_encode_args(profile: &RenderProfile) -> Vec<String> {
    vec![
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", profile.audio_bitrate_kbps.max(64)),
        "-ar".to_string(),
        profile.audio_sample_rate.to_string(),
    ]
}

/// A stage output counts only if it exists and is non-empty.
pub fn verify_output(path: &Path) -> ReelResult<u64> {
    let size = std::fs::metadata(path)
        .map_err(|_| ReelError::FileNotFound {
            path: path.to_path_buf(),
        })?
        .len();
    if size == 0 {
        return Err(ReelError::render(format!("{} is empty", path.display())));
    }
    Ok(size)
}

pub fn command_exists(binary: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Escape a path for use as a filter option value.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}

fn parse_probe_duration(stdout: &[u8]) -> Option<f64> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout).ok()?;
    probe
        .format?
        .duration?
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}

fn filter_listed(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|filter| filter == name)
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

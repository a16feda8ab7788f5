//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Working and output directories.
    pub paths: PathsConfig,

    /// Fixed output profile every job renders to.
    pub render: RenderProfile,

    /// Assembly pipeline tunables.
    pub pipeline: PipelineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Where scratch files and finished renders live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Parent directory for per-job scratch directories.
    pub work_dir: PathBuf,

    /// Directory finished renders are written to (append-only during a run).
    pub output_dir: PathBuf,
}

/// Target encode profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderProfile {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Video encoder passed to `-c:v`.
    pub video_codec: String,

    /// x264-style preset.
    pub preset: String,

    /// Constant rate factor.
    pub crf: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Audio sample rate for synthesized and mixed tracks.
    pub audio_sample_rate: u32,
}

/// Tunables for the assembly stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker count for parallel scene normalization.
    pub workers: usize,

    /// Timeout for a single remote asset fetch.
    pub fetch_timeout_secs: u64,

    /// Timeout for a single encode/decode invocation.
    pub process_timeout_secs: u64,

    /// Timeout for a duration probe.
    pub probe_timeout_secs: u64,

    /// Default crossfade length between scenes.
    pub crossfade_secs: f64,

    /// Deficit covered by one gap-fill scene.
    pub gap_unit_secs: f64,

    /// Target length used when pacing is not audio-driven.
    pub default_target_secs: f64,

    /// Gain applied to sound effects before mixing.
    pub sfx_gain_db: f64,

    /// Maximum words per caption phrase.
    pub max_phrase_words: usize,

    /// Hosts remote assets may be fetched from. A leading `.` matches
    /// any subdomain.
    pub allowed_hosts: Vec<String>,

    /// Largest remote asset accepted, in bytes.
    pub max_asset_bytes: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelsmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data = data_home().join("reelsmith");
        Self {
            work_dir: std::env::temp_dir().join("reelsmith"),
            output_dir: data.join("renders"),
        }
    }
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            audio_bitrate_kbps: 192,
            audio_sample_rate: 44_100,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            fetch_timeout_secs: 30,
            process_timeout_secs: 300,
            probe_timeout_secs: 15,
            crossfade_secs: 0.5,
            gap_unit_secs: 5.0,
            default_target_secs: 30.0,
            sfx_gain_db: -6.0,
            max_phrase_words: 4,
            allowed_hosts: vec![
                "images.pexels.com".to_string(),
                "videos.pexels.com".to_string(),
                "cdn.pixabay.com".to_string(),
                "images.unsplash.com".to_string(),
            ],
            max_asset_bytes: 512 * 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl PipelineConfig {
    /// Reject values that would make a stage meaningless.
    pub fn validate(&self) -> ReelResult<()> {
        if self.workers == 0 {
            return Err(config_error("pipeline.workers must be at least 1"));
        }
        if self.max_phrase_words == 0 {
            return Err(config_error("pipeline.max_phrase_words must be at least 1"));
        }
        if !(self.gap_unit_secs.is_finite() && self.gap_unit_secs > 0.0) {
            return Err(config_error("pipeline.gap_unit_secs must be positive"));
        }
        if !(self.crossfade_secs.is_finite() && self.crossfade_secs >= 0.0) {
            return Err(config_error("pipeline.crossfade_secs must be non-negative"));
        }
        if !(self.default_target_secs.is_finite() && self.default_target_secs > 0.0) {
            return Err(config_error("pipeline.default_target_secs must be positive"));
        }
        if self.max_asset_bytes == 0 {
            return Err(config_error("pipeline.max_asset_bytes must be at least 1"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> ReelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

fn config_error(message: &str) -> ReelError {
    ReelError::Config {
        message: message.to_string(),
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("reelsmith").join("config.json")
}

fn data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"))
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.pipeline.validate().is_ok());
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.max_phrase_words, 4);
        assert!((config.pipeline.gap_unit_secs - 5.0).abs() < f64::EPSILON);
        assert!((config.pipeline.sfx_gain_db + 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "pipeline": { "workers": 2 }, "render": { "fps": 24 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pipeline.workers, 2);
        assert_eq!(config.pipeline.max_phrase_words, 4);
        assert_eq!(config.render.fps, 24);
        assert_eq!(config.render.width, 1080);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let pipeline = PipelineConfig {
            workers: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            pipeline.validate(),
            Err(ReelError::Config { .. })
        ));
    }

    #[test]
    fn test_default_hosts_are_named_cdns() {
        let pipeline = PipelineConfig::default();
        assert!(!pipeline.allowed_hosts.is_empty());
        for host in &pipeline.allowed_hosts {
            assert!(!host.starts_with('.'), "{host} admits every subdomain");
            assert!(!host.ends_with("amazonaws.com") && !host.ends_with("googleapis.com"));
        }

        let capped = PipelineConfig {
            max_asset_bytes: 0,
            ..PipelineConfig::default()
        };
        assert!(capped.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = std::env::temp_dir().join(format!("reelsmith-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{ "pipeline": { "gap_unit_secs": 0.0 } }"#).unwrap();

        assert!(AppConfig::load_from(&path).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}

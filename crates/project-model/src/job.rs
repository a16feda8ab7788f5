//! Render requests and job status records.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::Scene;
use crate::style::CaptionStyle;
use crate::transcript::TranscriptWord;
use crate::{require_positive, ModelError};

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sound effects the audio stage knows how to synthesize.
pub const SFX_CATALOG: [&str; 5] = ["whoosh", "pop", "riser", "impact", "ding"];

/// A sound effect placed relative to the final video length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSfxRequest")]
pub struct SfxRequest {
    pub effect_type: String,
    /// Effect length in seconds.
    pub duration: f64,
    /// Where the effect lands, 0.0 = start, 1.0 = end.
    pub position_ratio: f64,
}

#[derive(Deserialize)]
struct RawSfxRequest {
    #[serde(alias = "type", alias = "effect")]
    effect_type: String,
    duration: f64,
    #[serde(default, alias = "position")]
    position_ratio: f64,
}

impl TryFrom<RawSfxRequest> for SfxRequest {
    type Error = ModelError;

    fn try_from(raw: RawSfxRequest) -> Result<Self, Self::Error> {
        SfxRequest::new(raw.effect_type, raw.duration, raw.position_ratio)
    }
}

impl SfxRequest {
    /// Validate a request. The position ratio is clamped into `[0, 1]`.
    pub fn new(
        effect_type: impl Into<String>,
        duration: f64,
        position_ratio: f64,
    ) -> Result<Self, ModelError> {
        let effect_type = effect_type.into().trim().to_ascii_lowercase();
        if effect_type.is_empty() {
            return Err(ModelError::new("effect_type", "must not be empty"));
        }
        if !position_ratio.is_finite() {
            return Err(ModelError::new("position_ratio", "must be a finite number"));
        }
        Ok(Self {
            effect_type,
            duration: require_positive("duration", duration)?,
            position_ratio: position_ratio.clamp(0.0, 1.0),
        })
    }

    pub fn is_known(&self) -> bool {
        SFX_CATALOG.contains(&self.effect_type.as_str())
    }
}

/// Everything one job needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    pub scenes: Vec<Scene>,

    /// Narration track; drives the output length when present.
    #[serde(default)]
    pub voiceover: Option<PathBuf>,

    /// Timed words for captions.
    #[serde(default)]
    pub transcript: Option<Vec<TranscriptWord>>,

    /// Script text used for estimated caption timing when no transcript is
    /// available.
    #[serde(default)]
    pub script: Option<String>,

    #[serde(default)]
    pub sfx: Vec<SfxRequest>,

    /// Spread the voiceover length evenly across scenes.
    #[serde(default)]
    pub audio_driven: bool,

    /// Target length for fixed pacing.
    #[serde(default)]
    pub target_duration: Option<f64>,

    #[serde(default = "default_true")]
    pub captions: bool,

    #[serde(default)]
    pub caption_style: CaptionStyle,
}

fn default_true() -> bool {
    true
}

impl RenderRequest {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self {
            scenes,
            voiceover: None,
            transcript: None,
            script: None,
            sfx: Vec::new(),
            audio_driven: false,
            target_duration: None,
            captions: true,
            caption_style: CaptionStyle::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.scenes.is_empty() {
            return Err(ModelError::new("scenes", "at least one scene is required"));
        }
        if self.audio_driven && self.voiceover.is_none() {
            return Err(ModelError::new(
                "audio_driven",
                "audio-driven pacing needs a voiceover",
            ));
        }
        if let Some(target) = self.target_duration {
            require_positive("target_duration", target)?;
        }
        Ok(())
    }

    /// Script text from the request, or the scenes' narration joined.
    pub fn narration_text(&self) -> String {
        match &self.script {
            Some(script) if !script.trim().is_empty() => script.clone(),
            _ => self
                .scenes
                .iter()
                .map(|s| s.script_text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Lifecycle state of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Queued,
    Composing,
    Transitioning,
    ReconcilingAudio,
    Captioning,
    Complete,
    Failed,
}

impl RenderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderStatus::Queued => "queued",
            RenderStatus::Composing => "composing",
            RenderStatus::Transitioning => "transitioning",
            RenderStatus::ReconcilingAudio => "reconciling_audio",
            RenderStatus::Captioning => "captioning",
            RenderStatus::Complete => "complete",
            RenderStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RenderStatus::Complete | RenderStatus::Failed)
    }

    /// Progress percentage reported on entering this state.
    pub fn base_percent(self) -> u8 {
        match self {
            RenderStatus::Queued => 0,
            RenderStatus::Composing => 10,
            RenderStatus::Transitioning => 50,
            RenderStatus::ReconcilingAudio => 65,
            RenderStatus::Captioning => 80,
            RenderStatus::Complete => 100,
            RenderStatus::Failed => 100,
        }
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fallback the pipeline took instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    pub stage: String,
    pub reason: String,
}

impl Degradation {
    pub fn new(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

/// Poll-able snapshot of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProgress {
    pub id: JobId,
    pub status: RenderStatus,
    pub percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_ref: Option<PathBuf>,
    #[serde(default)]
    pub degradations: Vec<Degradation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobProgress {
    pub fn queued(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: RenderStatus::Queued,
            percent: 0,
            error: None,
            output_ref: None,
            degradations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Finished without any fallback.
    pub fn is_clean(&self) -> bool {
        self.status == RenderStatus::Complete && self.degradations.is_empty()
    }
}

//! Scene records handed over by the planning collaborator.
//!
//! Planner output is loosely shaped JSON. It is deserialized through
//! [`RawScene`] and validated into a [`Scene`]; a scene is never mutated
//! after normalization, except that the timeline composer may override its
//! duration when pacing is audio-driven.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{require_positive, ModelError};

/// Narrative role of a scene, used to order scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorType {
    Hook,
    Claim,
    Evidence,
    Pivot,
    Counter,
    Closer,
    #[default]
    None,
}

impl AnchorType {
    /// Canonical narrative order of the recognized anchors.
    pub const CANONICAL_ORDER: [AnchorType; 6] = [
        AnchorType::Hook,
        AnchorType::Claim,
        AnchorType::Evidence,
        AnchorType::Pivot,
        AnchorType::Counter,
        AnchorType::Closer,
    ];

    /// Parse a planner label. Unrecognized labels map to `None`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "hook" => AnchorType::Hook,
            "claim" => AnchorType::Claim,
            "evidence" => AnchorType::Evidence,
            "pivot" => AnchorType::Pivot,
            "counter" | "counterpoint" => AnchorType::Counter,
            "closer" | "close" => AnchorType::Closer,
            _ => AnchorType::None,
        }
    }

    /// Position in the canonical order, `None` for unanchored scenes.
    pub fn rank(self) -> Option<usize> {
        Self::CANONICAL_ORDER.iter().position(|a| *a == self)
    }

    pub fn is_anchored(self) -> bool {
        self.rank().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnchorType::Hook => "hook",
            AnchorType::Claim => "claim",
            AnchorType::Evidence => "evidence",
            AnchorType::Pivot => "pivot",
            AnchorType::Counter => "counter",
            AnchorType::Closer => "closer",
            AnchorType::None => "none",
        }
    }
}

/// What kind of visual a scene resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// Moving footage, trimmed to the allotted duration.
    Clip,
    /// Still image, animated with pan/zoom.
    Image,
    /// Background filler synthesized to cover a timing gap.
    Filler,
}

impl SceneKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SceneKind::Clip => "clip",
            SceneKind::Image => "image",
            SceneKind::Filler => "filler",
        }
    }

    /// Guess the kind from a file extension, defaulting to a clip.
    pub fn from_extension(reference: &str) -> Self {
        let without_query = reference.split(['?', '#']).next().unwrap_or(reference);
        let ext = Path::new(without_query)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "tiff" => SceneKind::Image,
            _ => SceneKind::Clip,
        }
    }
}

/// Where a scene's visual comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    /// Remote asset fetched over HTTP(S).
    Url(String),
    /// Local file.
    Path(PathBuf),
    /// No source; the pipeline synthesizes the visual.
    Generated,
}

impl SourceRef {
    /// Classify a planner reference string.
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceRef::Url(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            SourceRef::Path(PathBuf::from(path))
        } else {
            SourceRef::Path(PathBuf::from(trimmed))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceRef::Url(_))
    }

    pub fn to_reference(&self) -> String {
        match self {
            SourceRef::Url(url) => url.clone(),
            SourceRef::Path(path) => path.display().to_string(),
            SourceRef::Generated => String::new(),
        }
    }
}

/// A validated scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScene", into = "RawScene")]
pub struct Scene {
    /// Position in the planner's original list.
    pub index: usize,
    pub source: SourceRef,
    pub kind: SceneKind,
    pub anchor: AnchorType,
    /// Narration text covered by this scene.
    pub script_text: String,
    /// Seconds the planner wants on screen.
    pub planned_duration: f64,
    /// Free-form camera/motion hint ("slow zoom in", "pan left", ...).
    pub direction_hint: Option<String>,
    /// Planner hint: place this scene right after the scene with this index.
    pub follows: Option<usize>,
}

impl Scene {
    /// Build a scene from a planner reference, inferring the kind from the
    /// reference's extension.
    pub fn new(
        index: usize,
        reference: &str,
        anchor: AnchorType,
        planned_duration: f64,
    ) -> Result<Self, ModelError> {
        if reference.trim().is_empty() {
            return Err(ModelError::new("source_ref", "must not be empty"));
        }
        Ok(Self {
            index,
            source: SourceRef::parse(reference),
            kind: SceneKind::from_extension(reference),
            anchor,
            script_text: String::new(),
            planned_duration: require_positive("planned_duration", planned_duration)?,
            direction_hint: None,
            follows: None,
        })
    }

    /// A synthesized background scene covering a timing gap.
    pub fn filler(index: usize, duration: f64) -> Self {
        Self {
            index,
            source: SourceRef::Generated,
            kind: SceneKind::Filler,
            anchor: AnchorType::None,
            script_text: String::new(),
            planned_duration: duration,
            direction_hint: Some("background".to_string()),
            follows: None,
        }
    }

    pub fn with_kind(mut self, kind: SceneKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_script(mut self, text: impl Into<String>) -> Self {
        self.script_text = text.into();
        self
    }

    pub fn with_direction(mut self, hint: impl Into<String>) -> Self {
        self.direction_hint = Some(hint.into());
        self
    }

    pub fn is_filler(&self) -> bool {
        self.kind == SceneKind::Filler
    }
}

/// Wire shape of a scene as the planner emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScene {
    pub index: usize,
    #[serde(alias = "source", alias = "url")]
    pub source_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SceneKind>,
    #[serde(default, alias = "anchor", skip_serializing_if = "Option::is_none")]
    pub anchor_type: Option<String>,
    #[serde(default)]
    pub script_text: String,
    #[serde(alias = "duration")]
    pub planned_duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follows: Option<usize>,
}

impl TryFrom<RawScene> for Scene {
    type Error = ModelError;

    fn try_from(raw: RawScene) -> Result<Self, Self::Error> {
        let kind = raw
            .kind
            .unwrap_or_else(|| SceneKind::from_extension(&raw.source_ref));
        let source = if kind == SceneKind::Filler {
            SourceRef::Generated
        } else if raw.source_ref.trim().is_empty() {
            return Err(ModelError::new("source_ref", "must not be empty"));
        } else {
            SourceRef::parse(&raw.source_ref)
        };

        Ok(Self {
            index: raw.index,
            source,
            kind,
            anchor: raw
                .anchor_type
                .as_deref()
                .map(AnchorType::parse)
                .unwrap_or_default(),
            script_text: raw.script_text,
            planned_duration: require_positive("planned_duration", raw.planned_duration)?,
            direction_hint: raw.direction_hint.filter(|h| !h.trim().is_empty()),
            follows: raw.follows,
        })
    }
}

impl From<Scene> for RawScene {
    fn from(scene: Scene) -> Self {
        Self {
            index: scene.index,
            source_ref: scene.source.to_reference(),
            kind: Some(scene.kind),
            anchor_type: scene.anchor.is_anchored().then(|| scene.anchor.as_str().to_string()),
            script_text: scene.script_text,
            planned_duration: scene.planned_duration,
            direction_hint: scene.direction_hint,
            follows: scene.follows,
        }
    }
}

//! Pan/zoom motion for still images.
//!
//! Stills are animated with one of four moves, eased with smoothstep so the
//! camera starts and stops gently. The same curve is evaluated here for
//! previews and tests, and emitted as a `zoompan` expression for encoding.

use serde::{Deserialize, Serialize};

/// Zoom factor reached at the end of a zoom move.
pub const ZOOM_AMOUNT: f64 = 0.2;

/// Fixed zoom held during a pan so there is room to travel.
pub const PAN_ZOOM: f64 = 1.15;

/// Camera move applied to a still image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    Static,
    ZoomIn,
    ZoomOut,
    Pan,
}

/// Rotation used when the planner gives no usable hint.
const ROTATION: [MotionKind; 4] = [
    MotionKind::ZoomIn,
    MotionKind::Pan,
    MotionKind::ZoomOut,
    MotionKind::Static,
];

impl MotionKind {
    /// Pick a move from the direction hint, else from the scene index.
    pub fn choose(hint: Option<&str>, scene_index: usize) -> Self {
        hint.and_then(Self::from_hint)
            .unwrap_or(ROTATION[scene_index % ROTATION.len()])
    }

    fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.to_ascii_lowercase();
        if hint.contains("zoom out") || hint.contains("zoom-out") || hint.contains("pull back") {
            Some(MotionKind::ZoomOut)
        } else if hint.contains("zoom") || hint.contains("push in") {
            Some(MotionKind::ZoomIn)
        } else if hint.contains("pan") || hint.contains("slide") || hint.contains("track") {
            Some(MotionKind::Pan)
        } else if hint.contains("static") || hint.contains("hold") || hint.contains("still") {
            Some(MotionKind::Static)
        } else {
            None
        }
    }

    /// Zoom factor at normalized time `t` in `[0, 1]`.
    pub fn zoom_at(self, t: f64) -> f64 {
        let e = smoothstep(t);
        match self {
            MotionKind::Static => 1.0,
            MotionKind::ZoomIn => 1.0 + ZOOM_AMOUNT * e,
            MotionKind::ZoomOut => 1.0 + ZOOM_AMOUNT * (1.0 - e),
            MotionKind::Pan => PAN_ZOOM,
        }
    }

    /// Horizontal position of the crop window at `t`, as a fraction of the
    /// available travel (0 = left edge, 0.5 = centered, 1 = right edge).
    pub fn pan_at(self, t: f64) -> f64 {
        match self {
            MotionKind::Pan => smoothstep(t),
            _ => 0.5,
        }
    }
}

/// Cubic ease-in-out on `[0, 1]`.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Output frames needed to cover `duration_secs`.
pub fn frame_count(duration_secs: f64, fps: u32) -> u64 {
    ((duration_secs * fps as f64).round() as u64).max(1)
}

/// `zoompan` filter for `kind` over `duration_secs`, producing
/// `width`x`height` at `fps`.
pub fn zoompan_filter(kind: MotionKind, duration_secs: f64, width: u32, height: u32, fps: u32) -> String {
    let frames = frame_count(duration_secs, fps);
    let last = frames.saturating_sub(1).max(1);
    let p = format!("min(on/{last},1)");
    let eased = format!("({p}*{p}*(3-2*{p}))");

    let zoom = match kind {
        MotionKind::Static => "1".to_string(),
        MotionKind::ZoomIn => format!("1+{ZOOM_AMOUNT}*{eased}"),
        MotionKind::ZoomOut => format!("{}-{ZOOM_AMOUNT}*{eased}", 1.0 + ZOOM_AMOUNT),
        MotionKind::Pan => format!("{PAN_ZOOM}"),
    };
    let x = match kind {
        MotionKind::Pan => format!("(iw-iw/zoom)*{eased}"),
        _ => "iw/2-(iw/zoom/2)".to_string(),
    };

    format!(
        "zoompan=z='{zoom}':x='{x}':y='ih/2-(ih/zoom/2)':d={frames}:s={width}x{height}:fps={fps}"
    )
}

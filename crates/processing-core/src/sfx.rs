//! Sound-effect placement.

use reelsmith_project_model::job::SfxRequest;

/// A sound effect resolved to an absolute start time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSfx {
    pub effect_type: String,
    pub start: f64,
    pub duration: f64,
}

impl PlacedSfx {
    /// `adelay` value in milliseconds.
    pub fn delay_ms(&self) -> u64 {
        (self.start * 1000.0).round().max(0.0) as u64
    }
}

/// Start time for an effect so it always fits inside `total_secs`.
pub fn placement_time(position_ratio: f64, total_secs: f64, effect_secs: f64) -> f64 {
    position_ratio.clamp(0.0, 1.0) * (total_secs - effect_secs).max(0.0)
}

/// Resolve requests against the final length, skipping unknown effects.
pub fn place_effects(requests: &[SfxRequest], total_secs: f64) -> Vec<PlacedSfx> {
    requests
        .iter()
        .filter(|req| {
            if !req.is_known() {
                tracing::warn!(effect = %req.effect_type, "Skipping unknown sound effect");
            }
            req.is_known()
        })
        .map(|req| PlacedSfx {
            effect_type: req.effect_type.clone(),
            start: placement_time(req.position_ratio, total_secs, req.duration),
            duration: req.duration,
        })
        .collect()
}

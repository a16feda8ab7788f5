//! Crossfade arithmetic for joining normalized clips.
//!
//! With clip durations `d` and transition length `t`, transition `i`
//! (1-based) starts at `sum(d[0..i]) - i * t` on the output timeline, and
//! the joined output is `sum(d) - (n - 1) * t` long.

/// Transition plan for a clip sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadePlan {
    /// Length of every transition in seconds.
    pub transition: f64,
    /// Start of each transition, one per clip boundary.
    pub offsets: Vec<f64>,
    /// Length of the joined output.
    pub output_duration: f64,
}

/// Transition length: the default, capped at 80% of the shortest clip.
pub fn transition_duration(durations: &[f64], default_secs: f64) -> f64 {
    let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
    if !shortest.is_finite() {
        return 0.0;
    }
    default_secs.min(0.8 * shortest).max(0.0)
}

/// Offsets of each transition for a fixed transition length.
pub fn transition_offsets(durations: &[f64], transition: f64) -> Vec<f64> {
    let mut elapsed = 0.0;
    durations
        .iter()
        .take(durations.len().saturating_sub(1))
        .enumerate()
        .map(|(i, d)| {
            elapsed += d;
            elapsed - (i + 1) as f64 * transition
        })
        .collect()
}

/// Plan the transitions for a sequence. Returns `None` for fewer than two
/// clips, where no transition is needed.
pub fn plan_crossfades(durations: &[f64], default_secs: f64) -> Option<CrossfadePlan> {
    if durations.len() < 2 {
        return None;
    }
    let transition = transition_duration(durations, default_secs);
    let offsets = transition_offsets(durations, transition);
    let total: f64 = durations.iter().sum();
    Some(CrossfadePlan {
        transition,
        offsets,
        output_duration: total - (durations.len() - 1) as f64 * transition,
    })
}

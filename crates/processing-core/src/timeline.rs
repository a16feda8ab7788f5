//! Timeline composition.
//!
//! Turns the planner's scene list into a contiguous [`Timeline`].
//!
//! # Algorithm
//!
//! 1. **Order** anchored scenes by narrative role (hook, claim, evidence,
//!    pivot, counter, closer), keeping planner order within one role.
//! 2. **Attach** each unanchored scene after the scene its `follows` hint
//!    names, or after the nearest anchored scene preceding it in planner
//!    order. Unanchored scenes ahead of every anchor lead the sequence.
//! 3. **Pace**: audio-driven pacing splits the voiceover length evenly;
//!    fixed pacing pads a short sequence with filler scenes.
//! 4. **Place** scenes back to back from zero.

use std::collections::{BTreeMap, HashMap};

use reelsmith_common::{ReelError, ReelResult};
use reelsmith_project_model::scene::Scene;
use reelsmith_project_model::timeline::{Timeline, TIME_EPSILON};

/// How the total length of the timeline is decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComposeTarget {
    /// Every scene gets `audio_secs / scene_count`.
    AudioDriven(f64),
    /// Planned durations are kept; a shortfall is covered by fillers.
    Fixed(f64),
}

/// Configuration for the composer.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Shortfall covered by one filler scene.
    pub gap_unit_secs: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self { gap_unit_secs: 5.0 }
    }
}

/// Orders, paces, and places scenes.
pub struct TimelineComposer {
    config: ComposerConfig,
}

impl TimelineComposer {
    pub fn new(config: ComposerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ComposerConfig::default())
    }

    /// Compose a timeline from planner scenes.
    pub fn compose(&self, scenes: &[Scene], target: ComposeTarget) -> ReelResult<Timeline> {
        if scenes.is_empty() {
            return Err(ReelError::timeline("no scenes to compose"));
        }

        let mut ordered = order_scenes(scenes);

        match target {
            ComposeTarget::AudioDriven(audio_secs) => {
                if !(audio_secs.is_finite() && audio_secs > 0.0) {
                    return Err(ReelError::timeline(format!(
                        "audio duration must be positive, got {audio_secs}"
                    )));
                }
                let each = audio_secs / ordered.len() as f64;
                for scene in &mut ordered {
                    scene.planned_duration = each;
                }
            }
            ComposeTarget::Fixed(target_secs) => {
                if !(target_secs.is_finite() && target_secs > 0.0) {
                    return Err(ReelError::timeline(format!(
                        "target duration must be positive, got {target_secs}"
                    )));
                }
                ordered = self.fill_gaps(ordered, target_secs);
            }
        }

        let timeline = Timeline::from_ordered(ordered);
        tracing::debug!(
            scenes = timeline.len(),
            fillers = timeline.filler_count(),
            total_secs = timeline.total_duration(),
            "Composed timeline"
        );
        Ok(timeline)
    }

    /// Number of filler scenes needed to cover `deficit` seconds.
    pub fn gap_count(&self, deficit: f64) -> usize {
        if deficit <= TIME_EPSILON {
            return 0;
        }
        ((deficit / self.config.gap_unit_secs).round() as usize).max(1)
    }

    fn fill_gaps(&self, mut ordered: Vec<Scene>, target_secs: f64) -> Vec<Scene> {
        let planned: f64 = ordered.iter().map(|s| s.planned_duration).sum();
        let deficit = target_secs - planned;
        let gaps = self.gap_count(deficit);
        if gaps == 0 {
            return ordered;
        }

        let each = deficit / gaps as f64;
        let next_index = ordered.iter().map(|s| s.index).max().unwrap_or(0) + 1;
        let positions = gap_positions(ordered.len(), gaps);

        tracing::info!(
            deficit_secs = deficit,
            gaps,
            each_secs = each,
            "Filling timeline shortfall"
        );

        // Insert back to front so earlier positions stay valid.
        for (k, position) in positions.into_iter().enumerate().rev() {
            ordered.insert(position, Scene::filler(next_index + k, each));
        }
        ordered
    }
}

/// Insertion points for `gaps` fillers spread evenly through `n` scenes.
/// Each point is an index into the original sequence (insert before it).
pub fn gap_positions(n: usize, gaps: usize) -> Vec<usize> {
    (0..gaps)
        .map(|k| {
            let raw = ((k + 1) * n) as f64 / (gaps + 1) as f64;
            (raw.round() as usize).clamp(1.min(n), n)
        })
        .collect()
}

/// Narrative ordering without pacing.
pub fn order_scenes(scenes: &[Scene]) -> Vec<Scene> {
    let by_index: HashMap<usize, usize> = scenes
        .iter()
        .enumerate()
        .map(|(pos, s)| (s.index, pos))
        .collect();

    // Where each unanchored scene hangs: Some(parent position) or None (lead).
    let mut children: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut leads = Vec::new();
    let mut last_anchor: Option<usize> = None;

    for (pos, scene) in scenes.iter().enumerate() {
        if scene.anchor.is_anchored() {
            last_anchor = Some(pos);
            continue;
        }

        let hinted = scene
            .follows
            .and_then(|target| by_index.get(&target).copied())
            .filter(|&target_pos| {
                target_pos != pos && (scenes[target_pos].anchor.is_anchored() || target_pos < pos)
            });

        match hinted.or(last_anchor) {
            Some(parent) => children.entry(parent).or_default().push(pos),
            None => leads.push(pos),
        }
    }

    let mut anchored: Vec<usize> = scenes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.anchor.is_anchored())
        .map(|(pos, _)| pos)
        .collect();
    // Stable sort keeps planner order within one role.
    anchored.sort_by_key(|&pos| scenes[pos].anchor.rank());

    let mut order = Vec::with_capacity(scenes.len());
    for pos in leads.into_iter().chain(anchored) {
        push_with_children(pos, &children, &mut order);
    }

    order.into_iter().map(|pos| scenes[pos].clone()).collect()
}

fn push_with_children(pos: usize, children: &BTreeMap<usize, Vec<usize>>, out: &mut Vec<usize>) {
    out.push(pos);
    if let Some(kids) = children.get(&pos) {
        for &kid in kids {
            push_with_children(kid, children, out);
        }
    }
}

//! Placed scenes.

use serde::{Deserialize, Serialize};

use crate::scene::Scene;

/// Tolerance used when comparing accumulated floating-point offsets.
pub const TIME_EPSILON: f64 = 1e-6;

/// A scene with its position on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedScene {
    pub scene: Scene,
    pub start: f64,
    pub end: f64,
}

impl TimedScene {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn index(&self) -> usize {
        self.scene.index
    }
}

/// Ordered, contiguous sequence of timed scenes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub scenes: Vec<TimedScene>,
}

impl Timeline {
    /// Place scenes back to back, in the given order, using each scene's
    /// planned duration.
    pub fn from_ordered(scenes: Vec<Scene>) -> Self {
        let mut cursor = 0.0;
        let scenes = scenes
            .into_iter()
            .map(|scene| {
                let start = cursor;
                cursor += scene.planned_duration;
                TimedScene {
                    scene,
                    start,
                    end: cursor,
                }
            })
            .collect();
        Self { scenes }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.scenes.last().map(|s| s.end).unwrap_or(0.0)
    }

    pub fn durations(&self) -> Vec<f64> {
        self.scenes.iter().map(TimedScene::duration).collect()
    }

    /// First scene starts at zero and every scene starts where the previous
    /// one ends.
    pub fn is_contiguous(&self) -> bool {
        let Some(first) = self.scenes.first() else {
            return true;
        };
        if first.start.abs() > TIME_EPSILON {
            return false;
        }
        self.scenes
            .windows(2)
            .all(|pair| (pair[0].end - pair[1].start).abs() <= TIME_EPSILON)
    }

    pub fn filler_count(&self) -> usize {
        self.scenes.iter().filter(|s| s.scene.is_filler()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::AnchorType;

    fn scene(index: usize, secs: f64) -> Scene {
        Scene::new(index, &format!("clip{index}.mp4"), AnchorType::None, secs).unwrap()
    }

    #[test]
    fn test_from_ordered_assigns_cumulative_offsets() {
        let timeline = Timeline::from_ordered(vec![scene(0, 2.0), scene(1, 3.5), scene(2, 1.5)]);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.scenes[1].start, 2.0);
        assert_eq!(timeline.scenes[1].end, 5.5);
        assert!((timeline.total_duration() - 7.0).abs() < TIME_EPSILON);
        assert!(timeline.is_contiguous());
    }

    #[test]
    fn test_gap_breaks_contiguity() {
        let mut timeline = Timeline::from_ordered(vec![scene(0, 2.0), scene(1, 2.0)]);
        timeline.scenes[1].start += 0.5;
        assert!(!timeline.is_contiguous());
    }

    proptest::proptest! {
        #[test]
        fn prop_from_ordered_is_contiguous(durations in proptest::collection::vec(0.05f64..20.0, 1..40)) {
            let scenes = durations.iter().enumerate().map(|(i, d)| scene(i, *d)).collect();
            let timeline = Timeline::from_ordered(scenes);
            proptest::prop_assert!(timeline.is_contiguous());
            let sum: f64 = durations.iter().sum();
            proptest::prop_assert!((timeline.total_duration() - sum).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::default();
        assert!(timeline.is_empty());
        assert_eq!(timeline.total_duration(), 0.0);
        assert!(timeline.is_contiguous());
    }
}

//! Reelsmith Processing Core
//!
//! Editing decisions computed ahead of any encoding:
//! - **Timeline:** narrative ordering, pacing, and gap fill
//! - **Crossfade:** transition length and offsets between clips
//! - **Motion:** eased pan/zoom moves for still images
//! - **Sfx:** sound-effect placement on the final timeline
//!
//! This crate is pure computation with no I/O and no process spawning.
//! All inputs are data; all outputs are data.

pub mod crossfade;
pub mod motion;
pub mod sfx;
pub mod timeline;

pub use crossfade::{plan_crossfades, CrossfadePlan};
pub use motion::MotionKind;
pub use sfx::{place_effects, PlacedSfx};
pub use timeline::{ComposeTarget, ComposerConfig, TimelineComposer};

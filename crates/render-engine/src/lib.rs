//! Reelsmith Render Engine
//!
//! Turns a render request into a finished vertical video by driving ffmpeg
//! through a fixed sequence of stages.
//!
//! # Pipeline Architecture
//!
//! ```text
//! scenes ──► compose timeline ──► fetch + normalize (bounded pool)
//!                                        │
//!                                        ▼
//!                              xfade join (hard-cut fallback)
//!                                        │
//! voiceover + sfx ──────────────► reconcile audio
//!                                        │
//! transcript / script ──────────► karaoke captions (burn-in)
//!                                        │
//!                                        ▼
//!                              <output_dir>/<job_id>.mp4
//! ```

pub mod audio;
pub mod burn;
pub mod compositor;
pub mod fetch;
pub mod ffmpeg;
pub mod jobs;
pub mod normalize;
pub mod pipeline;

pub use ffmpeg::Toolchain;
pub use jobs::{JobHandle, JobRegistry};
pub use pipeline::{plan_timeline, RenderOrchestrator};

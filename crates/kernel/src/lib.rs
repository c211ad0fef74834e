//! Scene kernel: authoritative car state and the per-tick update.
//!
//! # Invariants
//! - All state mutations flow through `SceneState::apply`.
//! - Heading and wheel angles wrap into `[0, 360)`; door angles never leave their range.

pub mod scene;
pub mod tuning;

pub use scene::{SceneState, TickReport};
pub use tuning::{Arena, Tuning, TuningError};

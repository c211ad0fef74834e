//! Shared types for the car scene.
//!
//! # Invariants
//! - Angles are stored in degrees.
//! - Commands are plain values; producing one never mutates scene state.

pub mod command;
pub mod types;

pub use command::{DoorSwing, DriveCommand, Longitudinal, Steer};
pub use types::{LightMode, Pose, wrap_degrees};

//! Scene renderer: renderer-agnostic interface.
//!
//! Turns a [`carscene_kernel::SceneState`] into draw calls for a
//! [`RenderBackend`]. Every part is drawn inside one scoped push/pop of the
//! [`TransformStack`], starting from either the world or the car root.
//!
//! # Invariants
//! - The renderer never mutates scene state.
//! - Stack depth after a frame equals stack depth before it.
//! - The ground plane is always shaded with the directional light.

pub mod backend;
pub mod camera;
pub mod lighting;
pub mod parts;
pub mod renderer;
pub mod stack;

pub use backend::{DrawCall, RecordedFrame, RecordingBackend, RenderBackend};
pub use camera::ChaseCamera;
pub use lighting::LightRig;
pub use parts::{Anchor, NOSE_YAW_DEG, PartDescriptor, PartId, car_parts, car_root};
pub use renderer::{FrameStats, SceneRenderer};
pub use stack::{LocalOp, StackError, TransformStack};

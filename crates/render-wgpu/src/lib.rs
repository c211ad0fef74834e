//! wgpu render backend for the car scene.
//!
//! Draws every recorded [`carscene_render::DrawCall`] as a unit box with one
//! shared pipeline. Per-frame light and camera data live in one uniform block;
//! per-draw transforms and colors are packed into a second buffer and selected
//! with a dynamic offset.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Shading branch is chosen per draw from the call's light mode.

mod gpu;
mod shaders;

pub use gpu::{BackendError, MAX_DRAWS, WgpuRenderer};
pub use shaders::SCENE_SHADER;

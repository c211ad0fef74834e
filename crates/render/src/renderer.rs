use crate::backend::{DrawCall, RenderBackend};
use crate::camera::ChaseCamera;
use crate::lighting::LightRig;
use crate::parts::{Anchor, car_parts, car_root};
use crate::stack::{StackError, TransformStack};
use carscene_kernel::SceneState;
use glam::Mat4;

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub draws: usize,
    /// Deepest the transform stack got while drawing.
    pub max_depth: usize,
}

/// Walks the fixed part list and issues one draw per part.
///
/// The renderer never mutates the scene; it reads a [`SceneState`] and
/// produces draw calls.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    pub stack: TransformStack,
    pub camera: ChaseCamera,
    pub lights: LightRig,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one frame of `scene` into `backend`.
    ///
    /// The stack depth after the frame equals the depth before it; any
    /// mismatch is reported as [`StackError::Unbalanced`].
    pub fn render<B: RenderBackend>(
        &mut self,
        scene: &SceneState,
        backend: &mut B,
    ) -> Result<FrameStats, StackError> {
        let depth_before = self.stack.depth();
        let root = car_root(&scene.pose);
        let mut stats = FrameStats::default();

        backend.begin_frame(&self.lights);
        self.stack.set(Mat4::IDENTITY);

        for part in car_parts(scene) {
            let light_mode = part.shading.unwrap_or(scene.light_mode);
            let model = self.stack.scoped(|stack| {
                if part.anchor == Anchor::Car {
                    stack.multiply(root);
                }
                for op in &part.ops {
                    stack.apply(op);
                }
                stats.max_depth = stats.max_depth.max(stack.depth());
                stack.current()
            })?;
            backend.draw_box(&DrawCall::new(part.id, part.color, model, light_mode));
            stats.draws += 1;
        }

        backend.set_camera(
            self.camera.view_matrix(&scene.pose),
            self.camera.projection_matrix(),
        );

        let depth_after = self.stack.depth();
        if depth_after != depth_before {
            return Err(StackError::Unbalanced {
                before: depth_before,
                after: depth_after,
            });
        }
        tracing::trace!(tick = scene.tick, draws = stats.draws, "frame rendered");
        Ok(stats)
    }
}

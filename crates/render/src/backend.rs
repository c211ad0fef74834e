use crate::lighting::LightRig;
use crate::parts::PartId;
use carscene_common::LightMode;
use glam::{Mat4, Vec3};
use std::fmt::Write as _;

/// One unit box to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub part: PartId,
    pub color: [f32; 3],
    pub model: Mat4,
    pub normal_matrix: Mat4,
    pub light_mode: LightMode,
}

impl DrawCall {
    pub fn new(part: PartId, color: [f32; 3], model: Mat4, light_mode: LightMode) -> Self {
        Self {
            part,
            color,
            model,
            normal_matrix: model.inverse().transpose(),
            light_mode,
        }
    }

    /// World-space centre of the drawn box.
    pub fn center(&self) -> Vec3 {
        self.model.transform_point3(Vec3::ZERO)
    }
}

/// Whatever actually puts boxes on screen.
///
/// A frame is `begin_frame`, any number of `draw_box` calls, then
/// `set_camera`. Backends present a frame after `set_camera`, so its draws use
/// the camera set at the end of that same frame.
pub trait RenderBackend {
    fn begin_frame(&mut self, lights: &LightRig);
    /// Draw the unit box spanning `-0.5..0.5` on every axis, transformed by
    /// `call.model`. Part ops are sized for this box.
    fn draw_box(&mut self, call: &DrawCall);
    fn set_camera(&mut self, view: Mat4, projection: Mat4);
}

/// A frame as seen by [`RecordingBackend`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedFrame {
    pub clear_color: [f32; 4],
    pub draws: Vec<DrawCall>,
    pub camera: Option<(Mat4, Mat4)>,
}

/// Backend that keeps every frame it is given. Used headless and in tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub frames: Vec<RecordedFrame>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    /// Human-readable dump of the last frame.
    pub fn summary(&self) -> String {
        let Some(frame) = self.last_frame() else {
            return "no frames recorded\n".to_string();
        };
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({} draws) ===",
            self.frames.len() - 1,
            frame.draws.len()
        );
        for call in &frame.draws {
            let c = call.center();
            let _ = writeln!(
                out,
                "  {:<18} center=({:.2}, {:.2}, {:.2}) color=({:.2}, {:.2}, {:.2}) light={:?}",
                call.part.name(),
                c.x,
                c.y,
                c.z,
                call.color[0],
                call.color[1],
                call.color[2],
                call.light_mode
            );
        }
        if let Some((view, _)) = frame.camera {
            let eye = view.inverse().transform_point3(Vec3::ZERO);
            let _ = writeln!(out, "Camera: eye=({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z);
        }
        out
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, lights: &LightRig) {
        self.frames.push(RecordedFrame {
            clear_color: lights.clear_color,
            ..RecordedFrame::default()
        });
    }

    fn draw_box(&mut self, call: &DrawCall) {
        match self.frames.last_mut() {
            Some(frame) => frame.draws.push(*call),
            None => tracing::warn!(part = %call.part, "draw outside of a frame dropped"),
        }
    }

    fn set_camera(&mut self, view: Mat4, projection: Mat4) {
        if let Some(frame) = self.frames.last_mut() {
            frame.camera = Some((view, projection));
        }
    }
}

use carscene_common::Pose;
use glam::{Mat4, Vec2, Vec3};

/// Fixed-eye camera that turns to keep the car in frame.
///
/// The look-at target follows the car at a damped rate per axis rather than
/// one to one.
#[derive(Debug, Clone, Copy)]
pub struct ChaseCamera {
    pub eye: Vec3,
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Divisors applied to the car's x and z to get the target.
    pub damping: Vec2,
}

impl Default for ChaseCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 6.0, 25.0),
            fov_deg: 30.0,
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 100.0,
            damping: Vec2::new(1.5, 3.0),
        }
    }
}

impl ChaseCamera {
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// Look-at point: the car position divided by the damping factors.
    pub fn target(&self, pose: &Pose) -> Vec3 {
        Vec3::new(pose.x / self.damping.x, 0.0, pose.z / self.damping.y)
    }

    /// Right-handed view from the fixed eye toward [`Self::target`].
    pub fn view_matrix(&self, pose: &Pose) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target(pose), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, pose: &Pose) -> Mat4 {
        self.projection_matrix() * self.view_matrix(pose)
    }
}

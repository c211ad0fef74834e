use carscene_common::LightMode;
use glam::Vec3;

/// The scene's single light, shared by both shading branches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    pub color: Vec3,
    /// Used by the point branch.
    pub position: Vec3,
    /// Used by the directional branch. Points from the surface toward the light.
    pub direction: Vec3,
    pub ambient: Vec3,
    pub clear_color: [f32; 4],
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            position: Vec3::new(0.0, 15.0, 20.0),
            direction: Vec3::new(0.5, 3.0, 4.0).normalize(),
            ambient: Vec3::splat(0.15),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl LightRig {
    /// Direction toward the light as seen from `position` under `mode`.
    pub fn light_dir(&self, position: Vec3, mode: LightMode) -> Vec3 {
        match mode {
            LightMode::Directional => self.direction,
            LightMode::Point => (self.position - position).normalize_or_zero(),
        }
    }

    /// Lambert plus ambient, matching the fragment shader.
    pub fn shade(&self, color: Vec3, normal: Vec3, position: Vec3, mode: LightMode) -> Vec3 {
        let n = normal.normalize_or_zero();
        let diffuse = n.dot(self.light_dir(position, mode)).max(0.0);
        color * (self.color * diffuse + self.ambient)
    }
}

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Car position on the ground plane plus its yaw and pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub x: f32,
    pub z: f32,
    /// Yaw about +Y in degrees. Heading 0 faces -Z.
    pub heading_deg: f32,
    /// Pitch about the car's X axis in degrees.
    pub pitch_deg: f32,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            x: 0.0,
            z: 5.0,
            heading_deg: 0.0,
            pitch_deg: 0.0,
        }
    }
}

impl Pose {
    /// World-space position of the car root (always on the ground, y = 0).
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }

    /// Unit step direction on the ground plane for the current heading.
    pub fn forward(&self) -> (f32, f32) {
        let (sin, cos) = self.heading_deg.to_radians().sin_cos();
        (-sin, -cos)
    }
}

/// Shading branch used for the car parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightMode {
    /// Fixed light direction, uniform across all vertices.
    #[default]
    Directional,
    /// Point light at a fixed world position.
    Point,
}

impl LightMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Directional => Self::Point,
            Self::Point => Self::Directional,
        }
    }

    /// Flag value passed to the shader (`1` selects the point light).
    pub fn shader_flag(self) -> u32 {
        match self {
            Self::Directional => 0,
            Self::Point => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_range() {
        assert_eq!(wrap_degrees(-20.0), 340.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(375.0), 15.0);
        assert_eq!(wrap_degrees(0.0), 0.0);
        let w = wrap_degrees(-1e-7);
        assert!((0.0..360.0).contains(&w));
    }

    #[test]
    fn default_pose_starts_at_z5() {
        let p = Pose::default();
        assert_eq!(p.position(), Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(p.heading_deg, 0.0);
    }

    #[test]
    fn heading_zero_faces_negative_z() {
        let (dx, dz) = Pose::default().forward();
        assert!(dx.abs() < 1e-6);
        assert!((dz + 1.0).abs() < 1e-6);
    }

    #[test]
    fn light_mode_toggles() {
        let m = LightMode::default();
        assert_eq!(m, LightMode::Directional);
        assert_eq!(m.toggled(), LightMode::Point);
        assert_eq!(m.toggled().toggled(), m);
        assert_eq!(LightMode::Point.shader_flag(), 1);
    }
}

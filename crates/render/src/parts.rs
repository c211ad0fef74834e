use crate::stack::LocalOp;
use carscene_common::{LightMode, Pose};
use carscene_kernel::SceneState;
use glam::{Mat4, Vec3};
use std::fmt;

/// The car model is built with its nose along +X; heading 0 faces -Z.
pub const NOSE_YAW_DEG: f32 = 90.0;

/// Every rigid part in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartId {
    Ground,
    Body,
    Roof,
    WheelRearLeft,
    WheelFrontLeft,
    WheelRearRight,
    WheelFrontRight,
    SpareTire,
    Bumper,
    HeadlightLeft,
    HeadlightRight,
    DoorRight,
    DoorLeft,
}

impl PartId {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Body => "body",
            Self::Roof => "roof",
            Self::WheelRearLeft => "wheel-rear-left",
            Self::WheelFrontLeft => "wheel-front-left",
            Self::WheelRearRight => "wheel-rear-right",
            Self::WheelFrontRight => "wheel-front-right",
            Self::SpareTire => "spare-tire",
            Self::Bumper => "bumper",
            Self::HeadlightLeft => "headlight-left",
            Self::HeadlightRight => "headlight-right",
            Self::DoorRight => "door-right",
            Self::DoorLeft => "door-left",
        }
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which accumulated transform a part's local ops start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    World,
    Car,
}

/// A box drawn with a fixed color and a fixed local transform sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDescriptor {
    pub id: PartId,
    pub color: [f32; 3],
    pub anchor: Anchor,
    pub ops: Vec<LocalOp>,
    /// Forces a shading branch regardless of the scene's light mode.
    pub shading: Option<LightMode>,
}

const GROUND_GREEN: [f32; 3] = [0.137_255, 0.556_863, 0.137_255];
const BODY_BLUE: [f32; 3] = [0.258_824, 0.258_824, 1.0];
const TIRE_BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const BUMPER_GREY: [f32; 3] = [0.658, 0.658, 0.658];
const HEADLIGHT_YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
const DOOR_BLUE: [f32; 3] = [0.1, 0.1, 1.0];

fn scale(x: f32, y: f32, z: f32) -> LocalOp {
    LocalOp::Scale(Vec3::new(x, y, z))
}

fn translate(x: f32, y: f32, z: f32) -> LocalOp {
    LocalOp::Translate(Vec3::new(x, y, z))
}

fn rotate(deg: f32, axis: Vec3) -> LocalOp {
    LocalOp::Rotate { deg, axis }
}

fn car_part(id: PartId, color: [f32; 3], ops: Vec<LocalOp>) -> PartDescriptor {
    PartDescriptor {
        id,
        color,
        anchor: Anchor::Car,
        ops,
        shading: None,
    }
}

fn wheel(id: PartId, x: f32, z: f32, spin_deg: f32) -> PartDescriptor {
    car_part(
        id,
        TIRE_BLACK,
        vec![
            scale(0.3, 0.3, 0.3),
            translate(x, -0.5, z),
            rotate(spin_deg, Vec3::Z),
        ],
    )
}

/// Doors swing about a hinge at their front edge: move to the hinge, rotate,
/// then shift the panel back by half its length before scaling.
fn door(id: PartId, hinge_z: f32, angle_deg: f32) -> PartDescriptor {
    car_part(
        id,
        DOOR_BLUE,
        vec![
            translate(0.0, 0.18, hinge_z),
            rotate(angle_deg, Vec3::Y),
            translate(-0.175, 0.0, 0.0),
            scale(0.5, 0.2, 0.05),
        ],
    )
}

/// The fixed part list in draw order, posed from the current scene state.
pub fn car_parts(scene: &SceneState) -> Vec<PartDescriptor> {
    let spin = scene.wheel_deg;
    vec![
        PartDescriptor {
            id: PartId::Ground,
            color: GROUND_GREEN,
            anchor: Anchor::World,
            ops: vec![scale(50.0, 0.1, 50.0), translate(0.0, -10.5, 0.0)],
            shading: Some(LightMode::Directional),
        },
        car_part(PartId::Body, BODY_BLUE, vec![scale(1.5, 0.5, 0.75)]),
        car_part(
            PartId::Roof,
            BODY_BLUE,
            vec![scale(1.0, 0.375, 0.75), translate(-0.15, 1.0, 0.0)],
        ),
        wheel(PartId::WheelRearLeft, -1.5, -1.3, spin),
        wheel(PartId::WheelFrontLeft, 1.5, -1.3, spin),
        wheel(PartId::WheelRearRight, -1.5, 1.3, spin),
        wheel(PartId::WheelFrontRight, 1.5, 1.3, spin),
        car_part(
            PartId::SpareTire,
            TIRE_BLACK,
            vec![scale(0.3, 0.3, 0.3), translate(-2.5, 0.1, 0.0)],
        ),
        car_part(
            PartId::Bumper,
            BUMPER_GREY,
            vec![scale(0.15, 0.1, 0.65), translate(5.0, -1.3, 0.0)],
        ),
        car_part(
            PartId::HeadlightLeft,
            HEADLIGHT_YELLOW,
            vec![scale(0.15, 0.15, 0.15), translate(5.0, 0.75, -1.5)],
        ),
        car_part(
            PartId::HeadlightRight,
            HEADLIGHT_YELLOW,
            vec![scale(0.15, 0.15, 0.15), translate(5.0, 0.75, 1.5)],
        ),
        door(PartId::DoorRight, 0.4, scene.right_door_deg),
        door(PartId::DoorLeft, -0.4, scene.left_door_deg),
    ]
}

/// World transform of the car root: position, then yaw, then pitch.
pub fn car_root(pose: &Pose) -> Mat4 {
    Mat4::from_translation(pose.position())
        * Mat4::from_rotation_y((pose.heading_deg + NOSE_YAW_DEG).to_radians())
        * Mat4::from_rotation_x(pose.pitch_deg.to_radians())
}

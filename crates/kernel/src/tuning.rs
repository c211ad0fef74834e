use carscene_common::Pose;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors from loading or validating tuning.
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Axis-aligned rectangle on the ground plane the car is kept inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            min_x: -23.0,
            max_x: 23.0,
            min_z: -20.0,
            max_z: 25.0,
        }
    }
}

impl Arena {
    /// Inclusive on all four edges.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// Movement constants for the scene. Every field has a default, so a YAML
/// file only needs to name the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Distance travelled per movement tick.
    pub step: f32,
    /// Heading change per turn tick, degrees.
    pub turn_deg: f32,
    /// Wheel spin per movement tick, degrees.
    pub wheel_step_deg: f32,
    /// Door swing per tick, degrees.
    pub door_step_deg: f32,
    /// Fully open door angle, degrees.
    pub door_max_deg: f32,
    /// Repeat timer rate while keys are held.
    pub tick_hz: u32,
    pub arena: Arena,
    pub start: Pose,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            step: 0.3,
            turn_deg: 15.0,
            wheel_step_deg: 20.0,
            door_step_deg: 3.0,
            door_max_deg: 60.0,
            tick_hz: 50,
            arena: Arena::default(),
            start: Pose::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_yaml::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let tuning = Self::from_yaml_str(&text)?;
        tracing::info!("loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("step", self.step),
            ("turn_deg", self.turn_deg),
            ("wheel_step_deg", self.wheel_step_deg),
            ("door_step_deg", self.door_step_deg),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.door_max_deg > 0.0 && self.door_max_deg <= 180.0) {
            return Err(TuningError::Invalid(format!(
                "door_max_deg must be in (0, 180], got {}",
                self.door_max_deg
            )));
        }
        if self.tick_hz == 0 {
            return Err(TuningError::Invalid("tick_hz must be non-zero".into()));
        }
        let a = &self.arena;
        if !(a.min_x < a.max_x && a.min_z < a.max_z) {
            return Err(TuningError::Invalid(format!("empty arena {a:?}")));
        }
        Ok(())
    }

    /// Period of the key repeat timer.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz as f64)
    }
}

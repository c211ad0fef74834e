use crate::tuning::Tuning;
use carscene_common::{DoorSwing, DriveCommand, LightMode, Longitudinal, Pose, Steer, wrap_degrees};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a single `apply` changed. Used for logging and by callers that only
/// want to react to real changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// The car stepped (and possibly turned) inside the arena.
    pub moved: bool,
    /// The car was outside the arena and got nudged back instead of moving.
    pub corrected: bool,
    pub doors_changed: bool,
    pub light_toggled: bool,
}

impl TickReport {
    /// Nothing in the scene changed.
    pub fn is_idle(&self) -> bool {
        !(self.moved || self.corrected || self.doors_changed || self.light_toggled)
    }
}

/// The authoritative scene state.
///
/// All mutations go through [`SceneState::apply`]. The renderer only reads it.
///
/// # Invariants
/// - `pose.heading_deg` and `wheel_deg` stay in `[0, 360)`.
/// - `left_door_deg` stays in `[-door_max, 0]`, `right_door_deg` in `[0, door_max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    pub pose: Pose,
    /// Spin shared by all four wheels.
    pub wheel_deg: f32,
    pub left_door_deg: f32,
    pub right_door_deg: f32,
    pub light_mode: LightMode,
    /// Number of commands applied so far, idle ones included.
    pub tick: u64,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new(&Tuning::default())
    }
}

impl SceneState {
    /// Resting scene at the tuning's start pose, doors shut, directional light.
    pub fn new(tuning: &Tuning) -> Self {
        let mut pose = tuning.start;
        pose.heading_deg = wrap_degrees(pose.heading_deg);
        Self {
            pose,
            wheel_deg: 0.0,
            left_door_deg: 0.0,
            right_door_deg: 0.0,
            light_mode: LightMode::default(),
            tick: 0,
        }
    }

    /// Apply one tick worth of intents.
    ///
    /// Movement runs first, then both doors, then the light toggle. A neutral
    /// command only advances the tick counter.
    pub fn apply(&mut self, cmd: &DriveCommand, tuning: &Tuning) -> TickReport {
        let mut report = TickReport::default();

        if cmd.is_moving() {
            if tuning.arena.contains(self.pose.x, self.pose.z) {
                self.drive(cmd, tuning);
                report.moved = true;
            } else {
                self.return_to_arena(tuning);
                report.corrected = true;
            }
        }

        if let Some(swing) = cmd.left_door {
            report.doors_changed |= self.swing_left_door(swing, tuning);
        }
        if let Some(swing) = cmd.right_door {
            report.doors_changed |= self.swing_right_door(swing, tuning);
        }

        if cmd.toggle_light {
            self.light_mode = self.light_mode.toggled();
            report.light_toggled = true;
        }

        self.tick += 1;
        if !report.is_idle() {
            tracing::debug!(command = %cmd, "{self}");
        }
        report
    }

    fn drive(&mut self, cmd: &DriveCommand, tuning: &Tuning) {
        let reversing = cmd.longitudinal == Some(Longitudinal::Backward);
        let (direction, wheel_delta) = match (cmd.longitudinal, cmd.steer) {
            (_, Some(steer)) => {
                // Steering while reversing swings the nose the other way.
                let mut turn = match steer {
                    Steer::Left => tuning.turn_deg,
                    Steer::Right => -tuning.turn_deg,
                };
                if reversing {
                    turn = -turn;
                }
                self.pose.heading_deg = wrap_degrees(self.pose.heading_deg + turn);
                let direction = if reversing { -1.0 } else { 1.0 };
                (direction, tuning.wheel_step_deg)
            }
            (Some(Longitudinal::Forward), None) => (1.0, -tuning.wheel_step_deg),
            (Some(Longitudinal::Backward), None) => (-1.0, tuning.wheel_step_deg),
            (None, None) => return,
        };

        let (dx, dz) = self.pose.forward();
        self.pose.x += direction * tuning.step * dx;
        self.pose.z += direction * tuning.step * dz;
        self.wheel_deg = wrap_degrees(self.wheel_deg + wheel_delta);
    }

    /// Nudge one coordinate back toward the arena. Only the first offending
    /// edge is corrected per tick.
    fn return_to_arena(&mut self, tuning: &Tuning) {
        let arena = &tuning.arena;
        let pose = &mut self.pose;
        if pose.z > arena.max_z {
            pose.z -= tuning.step;
        } else if pose.z < arena.min_z {
            pose.z += tuning.step;
        } else if pose.x < arena.min_x {
            pose.x += tuning.step;
        } else if pose.x > arena.max_x {
            pose.x -= tuning.step;
        }
        tracing::debug!(x = pose.x, z = pose.z, "returning car to arena");
    }

    /// Left door opens toward negative angles.
    fn swing_left_door(&mut self, swing: DoorSwing, tuning: &Tuning) -> bool {
        let before = self.left_door_deg;
        let max = tuning.door_max_deg;
        match swing {
            DoorSwing::Open if self.left_door_deg > -max => {
                self.left_door_deg = (self.left_door_deg - tuning.door_step_deg).max(-max);
            }
            DoorSwing::Close if self.left_door_deg < 0.0 => {
                self.left_door_deg = (self.left_door_deg + tuning.door_step_deg).min(0.0);
            }
            _ => {}
        }
        self.left_door_deg != before
    }

    /// Right door opens toward positive angles.
    fn swing_right_door(&mut self, swing: DoorSwing, tuning: &Tuning) -> bool {
        let before = self.right_door_deg;
        let max = tuning.door_max_deg;
        match swing {
            DoorSwing::Open if self.right_door_deg < max => {
                self.right_door_deg = (self.right_door_deg + tuning.door_step_deg).min(max);
            }
            DoorSwing::Close if self.right_door_deg > 0.0 => {
                self.right_door_deg = (self.right_door_deg - tuning.door_step_deg).max(0.0);
            }
            _ => {}
        }
        self.right_door_deg != before
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick={} pos=({:.2}, {:.2}) heading={:.1} wheel={:.1} doors=(L {:.1}, R {:.1}) light={:?}",
            self.tick,
            self.pose.x,
            self.pose.z,
            self.pose.heading_deg,
            self.wheel_deg,
            self.left_door_deg,
            self.right_door_deg,
            self.light_mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn cmd(longitudinal: Option<Longitudinal>, steer: Option<Steer>) -> DriveCommand {
        DriveCommand {
            longitudinal,
            steer,
            ..DriveCommand::NEUTRAL
        }
    }

    fn doors(left: Option<DoorSwing>, right: Option<DoorSwing>) -> DriveCommand {
        DriveCommand {
            left_door: left,
            right_door: right,
            ..DriveCommand::NEUTRAL
        }
    }

    #[test]
    fn north_from_start_steps_toward_negative_z() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        let report = scene.apply(&DriveCommand::forward(), &tuning);

        assert!(report.moved);
        assert!((scene.pose.z - 4.7).abs() < EPS);
        assert!(scene.pose.x.abs() < EPS);
        assert_eq!(scene.wheel_deg, 340.0);
        assert_eq!(scene.pose.heading_deg, 0.0);
    }

    #[test]
    fn south_spins_wheel_forward() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        scene.apply(&DriveCommand::backward(), &tuning);
        assert!((scene.pose.z - 5.3).abs() < EPS);
        assert_eq!(scene.wheel_deg, 20.0);
    }

    #[test]
    fn north_then_south_returns_to_start() {
        let tuning = Tuning::default();
        for heading in [0.0, 15.0, 45.0, 90.0, 135.0, 200.0, 345.0] {
            let mut scene = SceneState::new(&tuning);
            scene.pose.x = 3.0;
            scene.pose.z = -7.0;
            scene.pose.heading_deg = heading;
            let start = scene.pose;

            scene.apply(&DriveCommand::forward(), &tuning);
            scene.apply(&DriveCommand::backward(), &tuning);
            assert!((scene.pose.x - start.x).abs() < EPS, "heading {heading}");
            assert!((scene.pose.z - start.z).abs() < EPS, "heading {heading}");
            assert_eq!(scene.wheel_deg, 0.0);

            scene.apply(&DriveCommand::backward(), &tuning);
            scene.apply(&DriveCommand::forward(), &tuning);
            assert!((scene.pose.x - start.x).abs() < EPS);
            assert!((scene.pose.z - start.z).abs() < EPS);
        }
    }

    #[test]
    fn turn_alone_turns_and_creeps() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        scene.apply(&DriveCommand::steer(Steer::Left), &tuning);

        assert_eq!(scene.pose.heading_deg, 15.0);
        // Creeps along the new heading: forward-left of a car facing -Z.
        assert!(scene.pose.x < 0.0);
        assert!(scene.pose.z < 5.0);
        assert_eq!(scene.wheel_deg, 20.0);

        scene.apply(&DriveCommand::steer(Steer::Right), &tuning);
        scene.apply(&DriveCommand::steer(Steer::Right), &tuning);
        assert_eq!(scene.pose.heading_deg, 345.0);
    }

    #[test]
    fn reversing_inverts_turn_direction() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        scene.apply(&cmd(Some(Longitudinal::Backward), Some(Steer::Left)), &tuning);
        assert_eq!(scene.pose.heading_deg, 345.0);
        // Moved backward along the new heading.
        assert!(scene.pose.z > 5.0);

        let mut scene = SceneState::new(&tuning);
        scene.apply(&cmd(Some(Longitudinal::Forward), Some(Steer::Left)), &tuning);
        assert_eq!(scene.pose.heading_deg, 15.0);
        assert!(scene.pose.z < 5.0);
    }

    #[test]
    fn outside_arena_corrects_single_axis_and_skips_turn() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        scene.pose.z = 25.2;
        scene.pose.x = 30.0;
        let report = scene.apply(&DriveCommand::steer(Steer::Left), &tuning);

        assert!(report.corrected);
        assert!(!report.moved);
        assert!((scene.pose.z - 24.9).abs() < EPS);
        assert_eq!(scene.pose.x, 30.0);
        assert_eq!(scene.pose.heading_deg, 0.0);
        assert_eq!(scene.wheel_deg, 0.0);
    }

    #[test]
    fn correction_edge_precedence() {
        let tuning = Tuning::default();
        let cases = [
            ((0.0, -20.5), (0.0, -20.2)),
            ((-23.5, 0.0), (-23.2, 0.0)),
            ((23.5, 0.0), (23.2, 0.0)),
            ((-30.0, -30.0), (-30.0, -29.7)),
        ];
        for ((x, z), (ex, ez)) in cases {
            let mut scene = SceneState::new(&tuning);
            scene.pose.x = x;
            scene.pose.z = z;
            scene.apply(&DriveCommand::backward(), &tuning);
            assert!((scene.pose.x - ex).abs() < EPS, "from ({x}, {z})");
            assert!((scene.pose.z - ez).abs() < EPS, "from ({x}, {z})");
        }
    }

    #[test]
    fn left_door_clamps_at_bounds() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        scene.left_door_deg = -60.0;
        let report = scene.apply(&doors(Some(DoorSwing::Open), None), &tuning);
        assert_eq!(scene.left_door_deg, -60.0);
        assert!(!report.doors_changed);

        scene.left_door_deg = 0.0;
        scene.apply(&doors(Some(DoorSwing::Close), None), &tuning);
        assert_eq!(scene.left_door_deg, 0.0);

        scene.apply(&doors(Some(DoorSwing::Open), None), &tuning);
        assert_eq!(scene.left_door_deg, -3.0);
    }

    #[test]
    fn doors_stay_in_range_when_held() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        let open = doors(Some(DoorSwing::Open), Some(DoorSwing::Open));
        for _ in 0..100 {
            scene.apply(&open, &tuning);
            assert!((-60.0..=0.0).contains(&scene.left_door_deg));
            assert!((0.0..=60.0).contains(&scene.right_door_deg));
        }
        assert_eq!(scene.left_door_deg, -60.0);
        assert_eq!(scene.right_door_deg, 60.0);

        let close = doors(Some(DoorSwing::Close), Some(DoorSwing::Close));
        for _ in 0..100 {
            scene.apply(&close, &tuning);
            assert!((-60.0..=0.0).contains(&scene.left_door_deg));
            assert!((0.0..=60.0).contains(&scene.right_door_deg));
        }
        assert_eq!(scene.left_door_deg, 0.0);
        assert_eq!(scene.right_door_deg, 0.0);
    }

    #[test]
    fn uneven_door_step_lands_on_bound() {
        let tuning = Tuning {
            door_step_deg: 7.0,
            ..Tuning::default()
        };
        let mut scene = SceneState::new(&tuning);
        for _ in 0..20 {
            scene.apply(&doors(None, Some(DoorSwing::Open)), &tuning);
        }
        assert_eq!(scene.right_door_deg, 60.0);
    }

    #[test]
    fn angles_wrap_after_long_drive() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        let pattern = [
            cmd(Some(Longitudinal::Forward), None),
            cmd(None, Some(Steer::Left)),
            cmd(Some(Longitudinal::Backward), Some(Steer::Right)),
            cmd(Some(Longitudinal::Backward), None),
            cmd(Some(Longitudinal::Forward), Some(Steer::Right)),
        ];
        for i in 0..2_000 {
            scene.apply(&pattern[i % pattern.len()], &tuning);
            assert!((0.0..360.0).contains(&scene.pose.heading_deg));
            assert!((0.0..360.0).contains(&scene.wheel_deg));
        }
    }

    #[test]
    fn light_toggle_flips_mode() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        let report = scene.apply(&DriveCommand::toggle_light(), &tuning);
        assert!(report.light_toggled);
        assert_eq!(scene.light_mode, LightMode::Point);
        scene.apply(&DriveCommand::toggle_light(), &tuning);
        assert_eq!(scene.light_mode, LightMode::Directional);
    }

    #[test]
    fn neutral_only_advances_tick() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        let before = scene.clone();
        let report = scene.apply(&DriveCommand::NEUTRAL, &tuning);
        assert!(report.is_idle());
        assert_eq!(scene.tick, 1);
        assert_eq!(scene.pose, before.pose);
        assert_eq!(scene.wheel_deg, before.wheel_deg);
    }

    #[test]
    fn combined_command_moves_and_swings_doors() {
        let tuning = Tuning::default();
        let mut scene = SceneState::new(&tuning);
        let combined = DriveCommand {
            longitudinal: Some(Longitudinal::Forward),
            left_door: Some(DoorSwing::Open),
            right_door: Some(DoorSwing::Open),
            ..DriveCommand::NEUTRAL
        };
        let report = scene.apply(&combined, &tuning);
        assert!(report.moved && report.doors_changed);
        assert_eq!(scene.left_door_deg, -3.0);
        assert_eq!(scene.right_door_deg, 3.0);
    }

    #[test]
    fn display_summary() {
        let scene = SceneState::default();
        let s = scene.to_string();
        assert!(s.contains("tick=0"));
        assert!(s.contains("pos=(0.00, 5.00)"));
    }
}

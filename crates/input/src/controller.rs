use crate::key::{KeyRole, TrackedKey};
use crate::timer::RepeatTimer;
use carscene_common::{DoorSwing, DriveCommand, Longitudinal, Steer};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Tracks held keys and turns them into one [`DriveCommand`] per timer tick.
///
/// # Invariants
/// - At most one repeat timer runs; it runs exactly while a tracked key is held.
/// - Releasing the last held key yields exactly one neutral command.
/// - The light toggle fires once per press, however long the key is held.
#[derive(Debug, Clone)]
pub struct InputController {
    held: BTreeSet<TrackedKey>,
    timer: RepeatTimer,
    /// Set on the press edge of the light key, consumed by the next tick.
    toggle_armed: bool,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(Duration::from_millis(20))
    }
}

impl InputController {
    pub fn new(period: Duration) -> Self {
        Self {
            held: BTreeSet::new(),
            timer: RepeatTimer::new(period),
            toggle_armed: false,
        }
    }

    pub fn period(&self) -> Duration {
        self.timer.period()
    }

    /// Key pressed. Returns `true` when this press started the repeat timer.
    ///
    /// The first command is produced on the first timer fire, one period later.
    pub fn key_down(&mut self, key: TrackedKey, now: Instant) -> bool {
        let newly_held = self.held.insert(key);
        if newly_held && key.role() == KeyRole::ToggleLight {
            self.toggle_armed = true;
        }
        let started = self.timer.start(now);
        if started {
            tracing::debug!(%key, "repeat timer started");
        }
        started
    }

    /// Key released. When no tracked key remains held the timer stops and a
    /// single neutral command is returned so the host redraws the resting pose.
    pub fn key_up(&mut self, key: TrackedKey) -> Option<DriveCommand> {
        if !self.held.remove(&key) || !self.held.is_empty() {
            return None;
        }
        self.timer.stop();
        self.toggle_armed = false;
        tracing::debug!(%key, "repeat timer stopped");
        Some(DriveCommand::NEUTRAL)
    }

    /// Produce a command if the repeat timer fired.
    pub fn poll(&mut self, now: Instant) -> Option<DriveCommand> {
        if self.timer.poll(now) {
            Some(self.compose())
        } else {
            None
        }
    }

    /// Resolve each axis from the held keys. Within an axis the first listed
    /// intent wins: forward over backward, left over right, open over close.
    pub fn compose(&mut self) -> DriveCommand {
        let longitudinal = if self.holds(KeyRole::Forward) {
            Some(Longitudinal::Forward)
        } else if self.holds(KeyRole::Backward) {
            Some(Longitudinal::Backward)
        } else {
            None
        };

        let steer = if self.holds(KeyRole::Left) {
            Some(Steer::Left)
        } else if self.holds(KeyRole::Right) {
            Some(Steer::Right)
        } else {
            None
        };

        let left_door = self.door(KeyRole::OpenLeftDoor, KeyRole::CloseLeftDoor);
        let right_door = self.door(KeyRole::OpenRightDoor, KeyRole::CloseRightDoor);

        DriveCommand {
            longitudinal,
            steer,
            left_door,
            right_door,
            toggle_light: std::mem::take(&mut self.toggle_armed),
        }
    }

    fn door(&self, open: KeyRole, close: KeyRole) -> Option<DoorSwing> {
        if self.holds(open) {
            Some(DoorSwing::Open)
        } else if self.holds(close) {
            Some(DoorSwing::Close)
        } else {
            None
        }
    }

    fn holds(&self, role: KeyRole) -> bool {
        self.held.iter().any(|k| k.role() == role)
    }

    pub fn held(&self) -> &BTreeSet<TrackedKey> {
        &self.held
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// When the host should wake up next, if the timer is running.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }
}

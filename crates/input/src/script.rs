//! Key scripts for headless replay.
//!
//! A script is a whitespace- or comma-separated list of steps. Each step names
//! the keys held together (joined with `+`) and how many timer ticks they stay
//! down: `w*10 a+w*5 p`. The tick count defaults to 1.

use crate::controller::InputController;
use crate::key::TrackedKey;
use carscene_common::DriveCommand;
use std::time::Instant;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown key {0:?}")]
    UnknownKey(String),
    #[error("bad tick count in step {0:?}")]
    BadCount(String),
    #[error("step {0:?} names no keys")]
    EmptyStep(String),
}

/// Keys held together for a number of ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    pub keys: Vec<TrackedKey>,
    pub ticks: u32,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(parse_step)
        .collect()
}

fn parse_step(token: &str) -> Result<ScriptStep, ScriptError> {
    let (keys_part, ticks) = match token.split_once('*') {
        Some((keys, count)) => {
            let ticks = count
                .parse::<u32>()
                .map_err(|_| ScriptError::BadCount(token.to_string()))?;
            (keys, ticks)
        }
        None => (token, 1),
    };

    let keys = keys_part
        .split('+')
        .filter(|name| !name.is_empty())
        .map(|name| TrackedKey::from_name(name).ok_or_else(|| ScriptError::UnknownKey(name.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    if keys.is_empty() {
        return Err(ScriptError::EmptyStep(token.to_string()));
    }
    Ok(ScriptStep { keys, ticks })
}

/// Drive `controller` through `steps` on a synthetic clock starting at `start`.
///
/// Every command the controller produces is handed to `on_command`, including
/// the neutral command emitted when a step releases its keys. Returns the
/// clock value after the last step.
pub fn run_script(
    controller: &mut InputController,
    steps: &[ScriptStep],
    start: Instant,
    mut on_command: impl FnMut(DriveCommand),
) -> Instant {
    let period = controller.period();
    let mut now = start;
    for step in steps {
        for key in &step.keys {
            controller.key_down(*key, now);
        }
        for _ in 0..step.ticks {
            now += period;
            if let Some(cmd) = controller.poll(now) {
                on_command(cmd);
            }
        }
        for key in &step.keys {
            if let Some(cmd) = controller.key_up(*key) {
                on_command(cmd);
            }
        }
    }
    now
}

#[cfg(test)]
mod tests {
    use super::*;
    use carscene_common::{Longitudinal, Steer};
    use std::time::Duration;

    #[test]
    fn parses_steps() {
        let steps = parse_script("w*10, a+w*5 p").unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], ScriptStep { keys: vec![TrackedKey::W], ticks: 10 });
        assert_eq!(steps[1].keys, vec![TrackedKey::A, TrackedKey::W]);
        assert_eq!(steps[2].ticks, 1);
        assert!(parse_script("").unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_steps() {
        assert_eq!(parse_script("x*2"), Err(ScriptError::UnknownKey("x".into())));
        assert_eq!(parse_script("w*many"), Err(ScriptError::BadCount("w*many".into())));
        assert_eq!(parse_script("*3"), Err(ScriptError::EmptyStep("*3".into())));
    }

    #[test]
    fn run_emits_ticks_then_neutral() {
        let mut input = InputController::new(Duration::from_millis(20));
        let steps = parse_script("w*3 a").unwrap();
        let mut commands = Vec::new();
        let start = Instant::now();
        let end = run_script(&mut input, &steps, start, |cmd| commands.push(cmd));

        assert_eq!(commands.len(), 6);
        assert!(commands[..3].iter().all(|c| c.longitudinal == Some(Longitudinal::Forward)));
        assert!(commands[3].is_neutral());
        assert_eq!(commands[4].steer, Some(Steer::Left));
        assert!(commands[5].is_neutral());
        assert_eq!(end, start + Duration::from_millis(80));
        assert!(!input.is_running());
    }

    #[test]
    fn held_light_key_in_script_toggles_once() {
        let mut input = InputController::default();
        let steps = parse_script("p*40").unwrap();
        let mut toggles = 0;
        run_script(&mut input, &steps, Instant::now(), |cmd| {
            toggles += usize::from(cmd.toggle_light);
        });
        assert_eq!(toggles, 1);
    }
}

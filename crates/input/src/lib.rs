//! Keyboard input controller.
//!
//! Raw key events never reach the kernel. The controller keeps the set of
//! held keys, runs a fixed-rate repeat timer while any are held, and on each
//! tick resolves them into one [`carscene_common::DriveCommand`].
//!
//! # Invariants
//! - The repeat timer is started at most once per hold and stopped on the last release.
//! - Light toggles are press-edge events, not held-state polling.

pub mod controller;
pub mod key;
pub mod script;
pub mod timer;

pub use controller::InputController;
pub use key::{KeyRole, TrackedKey};
pub use script::{ScriptError, ScriptStep, parse_script, run_script};
pub use timer::RepeatTimer;

//! ATX data types
//!
//! Core types for the pin-pulse control system: targets, action kinds,
//! line levels and press timings.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Timing constants for button presses
pub mod timing {
    use std::time::Duration;

    /// Momentary press to power a machine on
    pub const POWER_ON_PRESS: Duration = Duration::from_secs(1);

    /// Sustained press to trigger a shutdown
    pub const POWER_OFF_PRESS: Duration = Duration::from_secs(6);

    /// Momentary press on the reboot line
    pub const REBOOT_PRESS: Duration = Duration::from_secs(1);
}

/// Output level of a GPIO line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// Raw value written to the line
    pub fn value(self) -> u8 {
        match self {
            Level::High => 1,
            Level::Low => 0,
        }
    }
}

/// A controllable target machine
///
/// Identity is the 1-based position in the registry, which is also the
/// index shown in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Human-readable name
    pub label: String,
    /// Line wired to the power button
    pub power_line: u32,
    /// Line wired to the reboot button
    pub reboot_line: u32,
}

/// Requested button action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Momentary press of the power button
    PowerOn,
    /// Sustained press of the power button
    PowerOff,
    /// Momentary press of the reboot button
    Reboot,
}

impl ActionKind {
    /// The line this action presses on the given target
    pub fn line(self, target: &Target) -> u32 {
        match self {
            ActionKind::PowerOn | ActionKind::PowerOff => target.power_line,
            ActionKind::Reboot => target.reboot_line,
        }
    }

    /// How long the line is held high
    pub fn hold(self) -> Duration {
        match self {
            ActionKind::PowerOn => timing::POWER_ON_PRESS,
            ActionKind::PowerOff => timing::POWER_OFF_PRESS,
            ActionKind::Reboot => timing::REBOOT_PRESS,
        }
    }

    /// Menu digit for this action (token grammar)
    pub fn digit(self) -> char {
        match self {
            ActionKind::PowerOn => '1',
            ActionKind::PowerOff => '2',
            ActionKind::Reboot => '3',
        }
    }

    /// Action kind for a menu digit, if recognized
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(ActionKind::PowerOn),
            '2' => Some(ActionKind::PowerOff),
            '3' => Some(ActionKind::Reboot),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::PowerOn => write!(f, "power on"),
            ActionKind::PowerOff => write!(f, "power off"),
            ActionKind::Reboot => write!(f, "reboot"),
        }
    }
}

/// Completed pulse, reported back to the session for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseReport {
    /// Label of the pulsed target
    pub label: String,
    /// Line that was pulsed
    pub line: u32,
    /// Action that was performed
    pub kind: ActionKind,
}

//! powerctl - GPIO power/reboot console
//!
//! This crate provides the core functionality for powerctl, a small
//! operator console that presses the power and reboot buttons of target
//! machines by pulsing GPIO output lines.

pub mod atx;
pub mod config;
pub mod error;
pub mod session;

pub use error::{AppError, Result};

//! ATX Power Control Module
//!
//! Presses the power and reboot buttons of target machines by pulsing GPIO
//! output lines, the way a finger would press a front-panel switch.
//!
//! # Components
//!
//! - [`driver`]: claims output lines on a GPIO character device and
//!   guarantees they are driven low and released on every exit path
//! - [`registry`]: the ordered target list and the token grammar that maps
//!   menu input onto a `(target, action)` pair
//! - [`sequencer`]: the timed assert-hold-deassert pulse cycle, with the
//!   shared indicator line mirroring every pulse
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use powerctl::atx::{ActionSequencer, GpioDriver, PinDriver, TargetRegistry};
//! use powerctl::config::AppConfig;
//!
//! let config = AppConfig::default();
//! let registry = TargetRegistry::load(&config)?;
//! let driver: Arc<dyn PinDriver> = Arc::new(GpioDriver::open(&config.gpio_chip)?);
//! registry.configure_all(driver.as_ref())?;
//!
//! let sequencer = ActionSequencer::new(driver.clone(), registry.indicator_line());
//! let action = registry.resolve("11").unwrap();
//! sequencer.pulse(action.target, action.kind).await?;
//! driver.release_all();
//! ```

pub mod driver;
pub mod registry;
pub mod sequencer;
pub mod types;

pub use driver::{GpioDriver, PinDriver};
pub use registry::{ResolvedAction, TargetRegistry, EXIT_SENTINEL};
pub use sequencer::ActionSequencer;
pub use types::{timing, ActionKind, Level, PulseReport, Target};

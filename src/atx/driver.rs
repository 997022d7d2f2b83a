//! GPIO pin driver
//!
//! Owns the output lines claimed by this process. Lines are requested from
//! the Linux GPIO character device (/dev/gpiochipX) and held for the
//! lifetime of the driver; `release_all` drives every claimed line low and
//! returns it to the kernel. Dropping the driver releases too, so no exit
//! path leaves a line asserted.

use std::collections::HashMap;
use std::sync::Mutex;

use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use tracing::{debug, info, warn};

use super::types::Level;
use crate::error::{AppError, Result};

/// Consumer label reported to the kernel for claimed lines
const CONSUMER: &str = "powerctl";

/// Driver for digital output lines
///
/// The seam between the sequencer and the hardware: production code uses
/// [`GpioDriver`], tests substitute an in-memory recorder.
pub trait PinDriver: Send + Sync {
    /// Claim a line for output use, initially low
    ///
    /// Idempotent: configuring an already-claimed line is a no-op, so a
    /// batch of actions against the same target never fails here.
    fn configure_output(&self, line: u32) -> Result<()>;

    /// Set the output level of a previously-configured line
    fn write(&self, line: u32, level: Level) -> Result<()>;

    /// Drive every claimed line low and forget the claims
    ///
    /// Safe to call more than once; after it returns, `write` fails until
    /// the line is configured again.
    fn release_all(&self);
}

/// Pin driver backed by the Linux GPIO character device
pub struct GpioDriver {
    chip: Mutex<Chip>,
    handles: Mutex<HashMap<u32, LineHandle>>,
}

impl GpioDriver {
    /// Open the GPIO chip at the given device path
    pub fn open(device: &str) -> Result<Self> {
        info!("Opening GPIO chip {}", device);
        let chip = Chip::new(device)
            .map_err(|e| AppError::HardwareInit(format!("GPIO chip {} open failed: {}", device, e)))?;

        Ok(Self {
            chip: Mutex::new(chip),
            handles: Mutex::new(HashMap::new()),
        })
    }
}

impl PinDriver for GpioDriver {
    fn configure_output(&self, line: u32) -> Result<()> {
        let mut handles = self.handles.lock().unwrap();
        if handles.contains_key(&line) {
            debug!("Line {} already configured", line);
            return Ok(());
        }

        let mut chip = self.chip.lock().unwrap();
        let handle = chip
            .get_line(line)
            .map_err(|e| AppError::HardwareInit(format!("GPIO line {} failed: {}", line, e)))?
            .request(LineRequestFlags::OUTPUT, Level::Low.value(), CONSUMER)
            .map_err(|e| AppError::HardwareInit(format!("GPIO line {} request failed: {}", line, e)))?;

        handles.insert(line, handle);
        debug!("Line {} configured as output", line);
        Ok(())
    }

    fn write(&self, line: u32, level: Level) -> Result<()> {
        let handles = self.handles.lock().unwrap();
        let handle = handles
            .get(&line)
            .ok_or_else(|| AppError::HardwareWrite(format!("line {} not configured", line)))?;

        handle
            .set_value(level.value())
            .map_err(|e| AppError::HardwareWrite(format!("GPIO line {} set failed: {}", line, e)))
    }

    fn release_all(&self) {
        let mut handles = self.handles.lock().unwrap();
        if handles.is_empty() {
            return;
        }

        for (line, handle) in handles.iter() {
            if let Err(e) = handle.set_value(Level::Low.value()) {
                warn!("Failed to drive line {} low on release: {}", line, e);
            }
        }
        handles.clear();
        info!("All GPIO lines released");
    }
}

impl Drop for GpioDriver {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// In-memory pin driver recording every transition, for tests
#[cfg(test)]
pub struct MemoryDriver {
    configured: Mutex<std::collections::HashSet<u32>>,
    writes: Mutex<Vec<WriteEvent>>,
    configure_count: Mutex<HashMap<u32, u32>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

/// One recorded `write` call
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteEvent {
    pub line: u32,
    pub level: Level,
    pub at: tokio::time::Instant,
}

#[cfg(test)]
impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            configured: Mutex::new(std::collections::HashSet::new()),
            writes: Mutex::new(Vec::new()),
            configure_count: Mutex::new(HashMap::new()),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn writes(&self) -> Vec<WriteEvent> {
        self.writes.lock().unwrap().clone()
    }

    pub fn configured_lines(&self) -> std::collections::HashSet<u32> {
        self.configured.lock().unwrap().clone()
    }

    pub fn configure_count(&self, line: u32) -> u32 {
        *self.configure_count.lock().unwrap().get(&line).unwrap_or(&0)
    }

    pub fn fail_next_writes(&self) {
        self.fail_writes
            .store(true, std::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(test)]
impl PinDriver for MemoryDriver {
    fn configure_output(&self, line: u32) -> Result<()> {
        let mut configured = self.configured.lock().unwrap();
        if configured.insert(line) {
            *self.configure_count.lock().unwrap().entry(line).or_insert(0) += 1;
        }
        Ok(())
    }

    fn write(&self, line: u32, level: Level) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(AppError::HardwareWrite(format!(
                "injected failure on line {}",
                line
            )));
        }
        if !self.configured.lock().unwrap().contains(&line) {
            return Err(AppError::HardwareWrite(format!(
                "line {} not configured",
                line
            )));
        }
        self.writes.lock().unwrap().push(WriteEvent {
            line,
            level,
            at: tokio::time::Instant::now(),
        });
        Ok(())
    }

    fn release_all(&self) {
        self.configured.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_configure_is_idempotent() {
        let driver = MemoryDriver::new();
        driver.configure_output(21).unwrap();
        driver.configure_output(21).unwrap();
        assert_eq!(driver.configure_count(21), 1);
        assert_eq!(driver.configured_lines().len(), 1);
    }

    #[tokio::test]
    async fn test_write_requires_configuration() {
        let driver = MemoryDriver::new();
        let err = driver.write(21, Level::High).unwrap_err();
        assert!(matches!(err, AppError::HardwareWrite(_)));

        driver.configure_output(21).unwrap();
        driver.write(21, Level::High).unwrap();
    }

    #[tokio::test]
    async fn test_release_forgets_claims() {
        let driver = MemoryDriver::new();
        driver.configure_output(21).unwrap();
        driver.write(21, Level::High).unwrap();

        driver.release_all();
        let err = driver.write(21, Level::Low).unwrap_err();
        assert!(matches!(err, AppError::HardwareWrite(_)));

        // Reconfiguring restores write access
        driver.configure_output(21).unwrap();
        driver.write(21, Level::Low).unwrap();
    }

    #[tokio::test]
    async fn test_release_is_repeatable() {
        let driver = MemoryDriver::new();
        driver.configure_output(5).unwrap();
        driver.release_all();
        driver.release_all();
        assert!(driver.configured_lines().is_empty());
    }
}

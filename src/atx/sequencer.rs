//! Action sequencer
//!
//! Executes one pulse cycle for a resolved `(target, action)` pair: the
//! indicator line and the selected line go high together, the line is held
//! for the action's fixed press duration, then both go low. The hold is a
//! plain wall-clock wait; nothing else runs concurrently and there is no
//! cancellation mid-hold. A write failure propagates immediately, with no
//! retry; final line safety is the release path's job, not the sequencer's.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::debug;

use super::driver::PinDriver;
use super::types::{ActionKind, Level, PulseReport, Target};
use crate::error::Result;

/// Drives timed pulses on target lines, mirroring the indicator line
pub struct ActionSequencer {
    driver: Arc<dyn PinDriver>,
    indicator_line: u32,
}

impl ActionSequencer {
    pub fn new(driver: Arc<dyn PinDriver>, indicator_line: u32) -> Self {
        Self {
            driver,
            indicator_line,
        }
    }

    /// Execute exactly one pulse cycle
    pub async fn pulse(&self, target: &Target, kind: ActionKind) -> Result<PulseReport> {
        let line = kind.line(target);
        let hold = kind.hold();
        debug!(
            "Pulsing line {} for {:?} ({} \"{}\")",
            line, hold, kind, target.label
        );

        // Indicator first, then the target line; the hold starts once both
        // are high.
        self.driver.write(self.indicator_line, Level::High)?;
        self.driver.write(line, Level::High)?;

        sleep(hold).await;

        self.driver.write(line, Level::Low)?;
        self.driver.write(self.indicator_line, Level::Low)?;

        debug!("Pulse on line {} complete", line);
        Ok(PulseReport {
            label: target.label.clone(),
            line,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atx::driver::MemoryDriver;
    use crate::error::AppError;
    use std::time::Duration;

    fn target() -> Target {
        Target {
            label: "Test".to_string(),
            power_line: 21,
            reboot_line: 20,
        }
    }

    fn sequencer() -> (Arc<MemoryDriver>, ActionSequencer) {
        let driver = Arc::new(MemoryDriver::new());
        for line in [16, 21, 20] {
            driver.configure_output(line).unwrap();
        }
        let sequencer = ActionSequencer::new(driver.clone(), 16);
        (driver, sequencer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_pulse_shape() {
        let (driver, sequencer) = sequencer();
        let report = sequencer.pulse(&target(), ActionKind::PowerOn).await.unwrap();

        let writes = driver.writes();
        let lines: Vec<(u32, Level)> = writes.iter().map(|w| (w.line, w.level)).collect();
        assert_eq!(
            lines,
            vec![
                (16, Level::High),
                (21, Level::High),
                (21, Level::Low),
                (16, Level::Low),
            ]
        );
        // Both lines high before the hold, both low after it
        assert_eq!(writes[1].at - writes[0].at, Duration::ZERO);
        assert_eq!(writes[2].at - writes[1].at, Duration::from_secs(1));
        assert_eq!(writes[3].at - writes[2].at, Duration::ZERO);

        assert_eq!(report.label, "Test");
        assert_eq!(report.line, 21);
        assert_eq!(report.kind, ActionKind::PowerOn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_off_holds_six_seconds() {
        let (driver, sequencer) = sequencer();
        sequencer.pulse(&target(), ActionKind::PowerOff).await.unwrap();

        let writes = driver.writes();
        assert_eq!(writes[1].line, 21);
        assert_eq!(writes[2].at - writes[1].at, Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reboot_pulses_reboot_line() {
        let (driver, sequencer) = sequencer();
        let report = sequencer.pulse(&target(), ActionKind::Reboot).await.unwrap();

        assert_eq!(report.line, 20);
        let writes = driver.writes();
        assert_eq!(writes[1].line, 20);
        assert_eq!(writes[2].at - writes[1].at, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_propagates() {
        let (driver, sequencer) = sequencer();
        driver.fail_next_writes();

        let err = sequencer.pulse(&target(), ActionKind::PowerOn).await.unwrap_err();
        assert!(matches!(err, AppError::HardwareWrite(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfigured_line_fails() {
        let driver = Arc::new(MemoryDriver::new());
        let sequencer = ActionSequencer::new(driver, 16);

        let err = sequencer.pulse(&target(), ActionKind::PowerOn).await.unwrap_err();
        assert!(matches!(err, AppError::HardwareWrite(_)));
    }
}

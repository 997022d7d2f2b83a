//! Target registry
//!
//! Ordered list of controllable targets built from the validated
//! configuration, plus the token grammar that maps menu input onto a
//! `(target, action)` pair.

use tracing::warn;

use super::driver::PinDriver;
use super::types::{ActionKind, Target};
use crate::config::AppConfig;
use crate::error::{AppError, Result};

/// Token that ends an interactive session. Never matched by `resolve`.
pub const EXIT_SENTINEL: &str = "e";

/// A token resolved against the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAction<'a> {
    /// 1-based index of the target, as shown in the menu
    pub index: usize,
    pub target: &'a Target,
    pub kind: ActionKind,
}

/// Ordered registry of controllable targets and the shared indicator line
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    targets: Vec<Target>,
    indicator_line: u32,
}

impl TargetRegistry {
    /// Build the registry from configuration, validating line assignments
    ///
    /// Every line identifier must be unique across all targets and distinct
    /// from the indicator line; a collision names the offending entry.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let indicator_line = config.led_gpio;
        let mut claimed = std::collections::HashSet::from([indicator_line]);
        let mut targets = Vec::with_capacity(config.systems.len());

        for (i, system) in config.systems.iter().enumerate() {
            if system.label.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "systems entry {} has an empty label",
                    i + 1
                )));
            }
            if system.gpio_on == system.gpio_reboot {
                return Err(AppError::Config(format!(
                    "systems entry {} (\"{}\") uses line {} for both power and reboot",
                    i + 1,
                    system.label,
                    system.gpio_on
                )));
            }
            for line in [system.gpio_on, system.gpio_reboot] {
                if !claimed.insert(line) {
                    return Err(AppError::Config(format!(
                        "systems entry {} (\"{}\") reuses line {}",
                        i + 1,
                        system.label,
                        line
                    )));
                }
            }

            targets.push(Target {
                label: system.label.clone(),
                power_line: system.gpio_on,
                reboot_line: system.gpio_reboot,
            });
        }

        if targets.is_empty() {
            warn!("No targets configured, the menu will only offer exit");
        }

        Ok(Self {
            targets,
            indicator_line,
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn indicator_line(&self) -> u32 {
        self.indicator_line
    }

    /// Claim every registered line (indicator plus both lines of each
    /// target) as output, before any pulse is issued
    pub fn configure_all(&self, driver: &dyn PinDriver) -> Result<()> {
        driver.configure_output(self.indicator_line)?;
        for target in &self.targets {
            driver.configure_output(target.power_line)?;
            driver.configure_output(target.reboot_line)?;
        }
        Ok(())
    }

    /// Resolve a token of the form `"<1-based-index><action-digit>"`
    ///
    /// The action digit is 1 = power on, 2 = power off, 3 = reboot. Returns
    /// `None` for malformed tokens, out-of-range indices and unknown
    /// digits; a bad token is a normal outcome, not an error.
    pub fn resolve(&self, token: &str) -> Option<ResolvedAction<'_>> {
        if !token.is_ascii() {
            return None;
        }
        let (index_part, digit) = token.split_at(token.len().checked_sub(1)?);
        let kind = ActionKind::from_digit(digit.chars().next()?)?;

        let index: usize = index_part.parse().ok()?;
        // The grammar matches the rendered decimal index exactly, so
        // zero-padded forms like "01" do not resolve.
        if index_part != index.to_string() {
            return None;
        }

        let target = self.targets.get(index.checked_sub(1)?)?;
        Some(ResolvedAction {
            index,
            target,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;

    fn config_with(systems: Vec<SystemConfig>) -> AppConfig {
        AppConfig {
            systems,
            led_gpio: 16,
            ..AppConfig::default()
        }
    }

    fn system(label: &str, on: u32, reboot: u32) -> SystemConfig {
        SystemConfig {
            gpio_on: on,
            gpio_reboot: reboot,
            label: label.to_string(),
        }
    }

    fn registry_two_targets() -> TargetRegistry {
        let config = config_with(vec![system("Test", 21, 20), system("NAS", 5, 6)]);
        TargetRegistry::load(&config).unwrap()
    }

    #[test]
    fn test_load_defaults() {
        let registry = TargetRegistry::load(&AppConfig::default()).unwrap();
        assert_eq!(registry.targets().len(), 1);
        assert_eq!(registry.indicator_line(), 16);
        assert_eq!(registry.targets()[0].label, "Test machine");
    }

    #[test]
    fn test_load_rejects_duplicate_line_across_targets() {
        let config = config_with(vec![system("A", 21, 20), system("B", 21, 19)]);
        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("entry 2")));
    }

    #[test]
    fn test_load_rejects_power_reboot_collision_within_target() {
        let config = config_with(vec![system("A", 21, 21)]);
        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_load_rejects_indicator_collision() {
        let config = config_with(vec![system("A", 16, 20)]);
        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(ref msg) if msg.contains("16")));
    }

    #[test]
    fn test_load_rejects_empty_label() {
        let config = config_with(vec![system("  ", 21, 20)]);
        let err = TargetRegistry::load(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_resolve_valid_tokens() {
        let registry = registry_two_targets();

        let action = registry.resolve("11").unwrap();
        assert_eq!(action.index, 1);
        assert_eq!(action.target.label, "Test");
        assert_eq!(action.kind, ActionKind::PowerOn);

        let action = registry.resolve("12").unwrap();
        assert_eq!(action.kind, ActionKind::PowerOff);

        let action = registry.resolve("23").unwrap();
        assert_eq!(action.index, 2);
        assert_eq!(action.target.label, "NAS");
        assert_eq!(action.kind, ActionKind::Reboot);
    }

    #[test]
    fn test_resolve_multi_digit_index() {
        let systems = (0..12)
            .map(|i| system(&format!("m{}", i), 100 + 2 * i, 101 + 2 * i))
            .collect();
        let registry = TargetRegistry::load(&config_with(systems)).unwrap();

        let action = registry.resolve("121").unwrap();
        assert_eq!(action.index, 12);
        assert_eq!(action.kind, ActionKind::PowerOn);
    }

    #[test]
    fn test_resolve_rejects_bad_tokens() {
        let registry = registry_two_targets();
        for token in ["", "1", "4", "14", "99", "01", "0", "1x", "x1", "1 1", "-11"] {
            assert!(registry.resolve(token).is_none(), "token {:?}", token);
        }
    }

    #[test]
    fn test_exit_sentinel_never_resolves() {
        let registry = registry_two_targets();
        assert!(registry.resolve(EXIT_SENTINEL).is_none());
    }
}

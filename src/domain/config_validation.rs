//! Configuration validation.
//!
//! Checks every config value before a run.

use crate::domain::error::ReplayError;
use crate::domain::replay::TrailingTrades;
use crate::ports::config_port::ConfigPort;

pub fn validate_replay_config(config: &dyn ConfigPort) -> Result<(), ReplayError> {
    validate_positive(config, "replay", "lot_notional")?;
    validate_positive(config, "replay", "default_conversion_fx")?;
    validate_trailing_trades(config)?;
    validate_positive(config, "metrics", "starting_balance")?;
    Ok(())
}

/// A present key must hold a positive finite number.
fn validate_positive(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ReplayError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        Ok(_) => Err(ReplayError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be positive", key),
        }),
        Err(_) => Err(ReplayError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be a number, got '{}'", key, raw.trim()),
        }),
    }
}

fn validate_trailing_trades(config: &dyn ConfigPort) -> Result<(), ReplayError> {
    match config.get_string("replay", "trailing_trades") {
        None => Ok(()),
        Some(s) => s
            .parse::<TrailingTrades>()
            .map(|_| ())
            .map_err(|reason| ReplayError::ConfigInvalid {
                section: "replay".to_string(),
                key: "trailing_trades".to_string(),
                reason,
            }),
    }
}

/// Require `[input] ledger` unless a CLI override is given.
pub fn validate_input_config(
    config: &dyn ConfigPort,
    ledger_override: bool,
) -> Result<(), ReplayError> {
    if ledger_override {
        return Ok(());
    }
    match config.get_string("input", "ledger") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ReplayError::ConfigMissing {
            section: "input".to_string(),
            key: "ledger".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn valid_config() -> MockConfig {
        MockConfig::new()
            .set("replay", "lot_notional", "100000")
            .set("replay", "default_conversion_fx", "1.0")
            .set("replay", "trailing_trades", "drop")
            .set("metrics", "starting_balance", "100000")
            .set("input", "ledger", "ledger.csv")
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_replay_config(&valid_config()).is_ok());
        assert!(validate_input_config(&valid_config(), false).is_ok());
    }

    #[test]
    fn empty_config_uses_defaults() {
        assert!(validate_replay_config(&MockConfig::new()).is_ok());
    }

    #[test]
    fn zero_lot_notional_rejected() {
        let config = valid_config().set("replay", "lot_notional", "0");
        let err = validate_replay_config(&config).unwrap_err();
        assert!(matches!(err, ReplayError::ConfigInvalid { key, .. } if key == "lot_notional"));
    }

    #[test]
    fn non_numeric_fx_rejected() {
        let config = valid_config().set("replay", "default_conversion_fx", "abc");
        let err = validate_replay_config(&config).unwrap_err();
        assert!(
            matches!(err, ReplayError::ConfigInvalid { key, reason, .. } if key == "default_conversion_fx" && reason.contains("abc"))
        );
    }

    #[test]
    fn negative_starting_balance_rejected() {
        let config = valid_config().set("metrics", "starting_balance", "-5");
        let err = validate_replay_config(&config).unwrap_err();
        assert!(
            matches!(err, ReplayError::ConfigInvalid { section, key, .. } if section == "metrics" && key == "starting_balance")
        );
    }

    #[test]
    fn unknown_trailing_policy_rejected() {
        let config = valid_config().set("replay", "trailing_trades", "keep");
        let err = validate_replay_config(&config).unwrap_err();
        assert!(matches!(err, ReplayError::ConfigInvalid { key, .. } if key == "trailing_trades"));
    }

    #[test]
    fn missing_ledger_path() {
        let err = validate_input_config(&MockConfig::new(), false).unwrap_err();
        assert!(matches!(err, ReplayError::ConfigMissing { key, .. } if key == "ledger"));
        assert!(validate_input_config(&MockConfig::new(), true).is_ok());
    }
}

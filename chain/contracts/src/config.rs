//! Engine configuration

use bridge_types::numeric::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default chain id (local development chain).
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Default challenge period: 7 days.
pub const DEFAULT_CHALLENGE_PERIOD_SECS: i64 = 7 * 24 * 60 * 60;

/// Configuration for the withdrawal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chain/environment id mixed into every withdrawal id.
    pub chain_id: u64,
    /// Withdrawals of at least this amount wait out the challenge period.
    pub large_threshold: Amount,
    /// Delay between initiating and completing a large withdrawal.
    pub challenge_period_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            large_threshold: Decimal::from(10),
            challenge_period_secs: DEFAULT_CHALLENGE_PERIOD_SECS,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.large_threshold <= Decimal::ZERO {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.challenge_period_secs < 0 {
            return Err(ConfigError::InvalidChallengePeriod(self.challenge_period_secs));
        }
        Ok(())
    }

    /// Whether `amount` takes the deferred (challenge period) path.
    pub fn is_large(&self, amount: Amount) -> bool {
        amount >= self.large_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.challenge_period_secs, 604_800);
    }

    #[test]
    fn test_from_json_partial_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "chain_id": 1 }"#).unwrap();
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.large_threshold, Decimal::from(10));
    }

    #[test]
    fn test_from_json_full() {
        let config = EngineConfig::from_json(
            r#"{ "chain_id": 5, "large_threshold": "2.5", "challenge_period_secs": 3600 }"#,
        )
        .unwrap();
        assert_eq!(config.large_threshold, Decimal::new(25, 1));
        assert_eq!(config.challenge_period_secs, 3600);
    }

    #[test]
    fn test_from_json_rejects_zero_threshold() {
        let result = EngineConfig::from_json(r#"{ "large_threshold": "0" }"#);
        assert_eq!(result, Err(ConfigError::InvalidThreshold));
    }

    #[test]
    fn test_from_json_rejects_negative_period() {
        let result = EngineConfig::from_json(r#"{ "challenge_period_secs": -1 }"#);
        assert_eq!(result, Err(ConfigError::InvalidChallengePeriod(-1)));
    }

    #[test]
    fn test_from_json_malformed() {
        let result = EngineConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_is_large_inclusive() {
        let config = EngineConfig::default();
        assert!(config.is_large(Decimal::from(10)));
        assert!(!config.is_large(Decimal::new(999, 2)));
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::symbols::SymbolSet;

/// Length of the reel animation; score is applied only once it has elapsed.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 3_600;
pub const DEFAULT_BONUS_PROBABILITY: f64 = 0.1;
pub const DEFAULT_INITIAL_COINS: i64 = 10_000;
pub const DEFAULT_INITIAL_BET: i64 = 50;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("board must have at least one row and one column, got {rows}x{columns}")]
    EmptyBoard { rows: usize, columns: usize },
    #[error("symbol count must be between 1 and 255, got {0}")]
    SymbolCount(usize),
    #[error("bonus probability must lie in [0, 1], got {0}")]
    BonusProbability(f64),
    #[error("bet range {min}..={max} is empty or not positive")]
    BetRange { min: i64, max: i64 },
    #[error("initial bet {bet} outside {min}..={max}")]
    InitialBet { bet: i64, min: i64, max: i64 },
}

/// Server-side generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub columns: usize,
    pub symbol_count: usize,
    pub bonus_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 3,
            symbol_count: 6,
            bonus_probability: DEFAULT_BONUS_PROBABILITY,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ConfigError::EmptyBoard {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.symbol_count == 0 || self.symbol_count > u8::MAX as usize {
            return Err(ConfigError::SymbolCount(self.symbol_count));
        }
        if !(0.0..=1.0).contains(&self.bonus_probability) {
            return Err(ConfigError::BonusProbability(self.bonus_probability));
        }
        Ok(())
    }

    pub fn symbols(&self) -> SymbolSet {
        SymbolSet::first(self.symbol_count)
    }
}

/// Client-side session parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub settle_delay_ms: u64,
    pub initial_coins: i64,
    pub initial_bet: i64,
    pub min_bet: i64,
    pub max_bet: i64,
    pub autoplay: bool,
    /// Give the stake back when the outcome request fails.
    pub refund_on_failure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            initial_coins: DEFAULT_INITIAL_COINS,
            initial_bet: DEFAULT_INITIAL_BET,
            min_bet: 1,
            max_bet: 100,
            autoplay: false,
            refund_on_failure: false,
        }
    }
}

impl SessionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bet < 1 || self.min_bet > self.max_bet {
            return Err(ConfigError::BetRange {
                min: self.min_bet,
                max: self.max_bet,
            });
        }
        if !(self.min_bet..=self.max_bet).contains(&self.initial_bet) {
            return Err(ConfigError::InitialBet {
                bet: self.initial_bet,
                min: self.min_bet,
                max: self.max_bet,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GeneratorConfig::default().validate().unwrap();
        SessionConfig::default().validate().unwrap();
        assert_eq!(SessionConfig::default().settle_delay(), Duration::from_millis(3_600));
    }

    #[test]
    fn rejects_bad_generator_params() {
        let zero_rows = GeneratorConfig {
            rows: 0,
            ..Default::default()
        };
        assert!(matches!(zero_rows.validate(), Err(ConfigError::EmptyBoard { .. })));

        let too_many = GeneratorConfig {
            symbol_count: 300,
            ..Default::default()
        };
        assert_eq!(too_many.validate(), Err(ConfigError::SymbolCount(300)));

        let nan = GeneratorConfig {
            bonus_probability: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::BonusProbability(_))));
    }

    #[test]
    fn rejects_bet_outside_range() {
        let cfg = SessionConfig {
            initial_bet: 500,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InitialBet {
                bet: 500,
                min: 1,
                max: 100
            })
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: GeneratorConfig = serde_json::from_str(r#"{"rows": 3}"#).unwrap();
        assert_eq!(cfg.rows, 3);
        assert_eq!(cfg.columns, 3);
        assert_eq!(cfg.bonus_probability, DEFAULT_BONUS_PROBABILITY);
    }
}

//! Engine configuration.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EXCHANGE;
use crate::errors::{Error, Result};
use crate::utils::time_utils::{valuation_date_from_utc, DEFAULT_VALUATION_TZ};

/// Settings shared by the valuation builder, the rebuild coordinator and window queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Exchange code handed to the trading calendar.
    pub exchange: String,
    /// Timezone used to map trade instants to valuation dates.
    pub timezone: Tz,
    /// Holdings with an absolute quantity below this are treated as closed. Zero by
    /// default, so any nonzero position is kept.
    pub quantity_threshold: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exchange: DEFAULT_EXCHANGE.to_string(),
            timezone: DEFAULT_VALUATION_TZ,
            quantity_threshold: Decimal::ZERO,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document; missing keys take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.exchange.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "exchange must not be empty".to_string(),
            ));
        }
        if self.quantity_threshold.is_sign_negative() {
            return Err(Error::InvalidConfigValue(format!(
                "quantityThreshold must not be negative, got {}",
                self.quantity_threshold
            )));
        }
        Ok(())
    }

    /// Valuation date of a trade instant under this configuration.
    pub fn valuation_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        valuation_date_from_utc(instant, self.timezone)
    }

    pub fn is_quantity_significant(&self, quantity: &Decimal) -> bool {
        quantity.abs() >= self.quantity_threshold && !quantity.is_zero()
    }
}

//! Runtime configuration.
//!
//! Fee rates and the weekly allowance are plain values with documented
//! defaults. The exchange rate URL and the log level can be overridden from
//! the environment; everything else is set in code.

use log::Level;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::types::{self, Amount};

pub const DEFAULT_RATES_URL: &str =
    "https://developers.paysera.com/tasks/api/currency-exchange-rates";
pub const DEFAULT_BASE_CURRENCY: &str = "EUR";

const RATES_URL_VAR: &str = "COMMISSION_FEES_RATES_URL";
const LOG_LEVEL_VAR: &str = "COMMISSION_FEES_LOG_LEVEL";

/// Commission rates in percent.
///
/// Defaults: private deposit 0.03%, business deposit 0.03%, private withdrawal
/// 0.3% (applied to the part above the weekly allowance), business withdrawal
/// 0.5%.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRates {
    pub deposit_private: Decimal,
    pub deposit_business: Decimal,
    pub withdraw_private: Decimal,
    pub withdraw_business: Decimal,
}

impl Default for FeeRates {
    fn default() -> Self {
        FeeRates {
            deposit_private: Decimal::new(3, 2),
            deposit_business: Decimal::new(3, 2),
            withdraw_private: Decimal::new(3, 1),
            withdraw_business: Decimal::new(5, 1),
        }
    }
}

impl FeeRates {
    /// Converts a percentage into a multiplier, e.g. 0.03 -> 0.0003.
    pub fn fraction(percent: Decimal) -> Result<Decimal> {
        types::div(percent, Decimal::ONE_HUNDRED)
    }
}

/// Free withdrawal budget of a private client per ISO week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyAllowance {
    /// Number of withdrawals after which every further one is fully charged.
    pub free_withdrawals: usize,
    /// Cumulative free amount, in base currency.
    pub free_amount: Amount,
}

impl Default for WeeklyAllowance {
    fn default() -> Self {
        WeeklyAllowance {
            free_withdrawals: 3,
            free_amount: Decimal::ONE_THOUSAND,
        }
    }
}

/// Everything the fee engine and its collaborators are configured with.
#[derive(Debug, Clone)]
pub struct Config {
    pub fees: FeeRates,
    pub allowance: WeeklyAllowance,
    pub base_currency: String,
    pub rates_url: String,
    pub delimiter: u8,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fees: FeeRates::default(),
            allowance: WeeklyAllowance::default(),
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            rates_url: DEFAULT_RATES_URL.to_string(),
            delimiter: b',',
            log_level: Level::Warn,
        }
    }
}

impl Config {
    /// Default configuration with overrides taken from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Default configuration with overrides taken from `lookup`.
    ///
    /// Blank values are ignored, as are log levels that don't parse.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| non_blank(lookup(name));

        let mut config = Config::default();

        if let Some(url) = value(RATES_URL_VAR) {
            config.rates_url = url;
        }

        let level: Option<Level> = value(LOG_LEVEL_VAR).and_then(|v| v.parse().ok());
        if let Some(level) = level {
            config.log_level = level;
        }

        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    let value = value?.trim().to_string();
    (!value.is_empty()).then_some(value)
}

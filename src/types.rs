//! Core data types for commission fee computation.
//!
//! This module defines the records fed to the fee engine, the fees it produces
//! and the fixed-scale decimal arithmetic used for every intermediate value.
//!
//! # Type Aliases
//!
//! - [`ClientId`]: Opaque client identifier, compared for equality only
//! - [`Amount`]: Monetary amount (Decimal)
//! - [`Currency`]: ISO 4217-like currency code
//!
//! # Core Types
//!
//! - [`EntityType`]: Whether a client is a private individual or a business
//! - [`Action`]: Deposit or withdrawal
//! - [`Record`]: A single operation, one per input line
//! - [`Fee`]: The rounded commission fee of one record
//!
//! # Precision
//!
//! The amount of a record keeps the number of fractional digits it was written
//! with, and that digit count drives the precision of the reported fee:
//! ```
//! use commission_fees::types::{Action, EntityType, Record};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! let record = Record {
//!     operation_date: NaiveDate::from_ymd_opt(2016, 1, 5).unwrap(),
//!     client_id: "1".to_string(),
//!     entity_type: EntityType::Private,
//!     action: Action::Deposit,
//!     amount: Decimal::from_str("200.00").unwrap(),
//!     currency: "EUR".to_string(),
//! };
//!
//! assert_eq!(record.precision(), 2);
//! ```

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, de};
use std::fmt;

use crate::error::{FeeError, Result};

pub type ClientId = String;
pub type Amount = Decimal;
pub type Currency = String;

/// Number of fractional digits carried by every intermediate value.
pub const SCALE: u32 = 10;

/// Kind of client an operation belongs to.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Private,
    Business,
}

/// Direction of an operation.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Deposit,
    Withdraw,
}

/// A single operation read from the input.
///
/// Records are identified by their position in the input: the weekly
/// allowance of a private withdrawal only looks at records placed before it.
///
/// # Fields
///
/// - `operation_date`: Calendar date of the operation (`YYYY-MM-DD`)
/// - `client_id`: Client identifier
/// - `entity_type`: `private` or `business`
/// - `action`: `deposit` or `withdraw`
/// - `amount`: Non-negative amount, with its written fractional digits preserved
/// - `currency`: Currency code of the amount
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Record {
    pub operation_date: NaiveDate,
    pub client_id: ClientId,
    pub entity_type: EntityType,
    pub action: Action,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
    pub currency: Currency,
}

impl Record {
    /// Number of fractional digits the amount was written with.
    pub fn precision(&self) -> u32 {
        self.amount.scale()
    }

    pub fn is_private_withdrawal(&self) -> bool {
        self.entity_type == EntityType::Private && self.action == Action::Withdraw
    }
}

/// Parses an amount from its textual form, keeping trailing zeros.
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    let amount: Decimal = rust_decimal::serde::str::deserialize(deserializer)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(de::Error::custom(format!("negative amount: {}", amount)));
    }
    Ok(amount)
}

/// Commission fee of a single record.
///
/// The amount is already rounded and carries exactly the number of fractional
/// digits it is reported with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fee {
    pub amount: Amount,
}

impl Fee {
    /// Rounds a raw fee up (towards positive infinity) to `precision` digits.
    pub fn round_up(raw: Amount, precision: u32) -> Self {
        let strategy = RoundingStrategy::ToPositiveInfinity;
        let mut amount = raw.round_dp_with_strategy(precision, strategy);
        amount.rescale(precision);
        // -0 rounds to zero but would print with a sign
        if amount.is_zero() {
            amount.set_sign_positive(true);
        }
        Fee { amount }
    }

    pub fn precision(&self) -> u32 {
        self.amount.scale()
    }
}

impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.amount)
    }
}

/// Truncates a value to the internal scale.
pub fn at_scale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero)
}

fn checked(value: Option<Decimal>, operation: &'static str) -> Result<Decimal> {
    value.map(at_scale).ok_or(FeeError::Overflow(operation))
}

pub fn add(a: Decimal, b: Decimal) -> Result<Decimal> {
    checked(a.checked_add(b), "addition")
}

pub fn sub(a: Decimal, b: Decimal) -> Result<Decimal> {
    checked(a.checked_sub(b), "subtraction")
}

pub fn mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    checked(a.checked_mul(b), "multiplication")
}

pub fn div(a: Decimal, b: Decimal) -> Result<Decimal> {
    checked(a.checked_div(b), "division")
}

/// Floors a value at zero, comparing at the internal scale.
pub fn non_negative(value: Decimal) -> Decimal {
    let value = at_scale(value);
    if value <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        value
    }
}

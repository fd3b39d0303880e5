//! Commission fee engine.
//!
//! This module holds the core business logic: selecting the rate that applies
//! to each record, applying the weekly allowance of private withdrawals and
//! rounding every fee to the precision its record was written with.

use chrono::{Datelike, Days, NaiveDate};
use log::trace;
use rust_decimal::Decimal;

use crate::config::{FeeRates, WeeklyAllowance};
use crate::converter::CurrencyConverter;
use crate::error::Result;
use crate::types::{self, Action, Amount, EntityType, Fee, Record};

/// Computes fees for ordered batches of records.
pub struct FeeEngine<'a> {
    fees: &'a FeeRates,
    allowance: &'a WeeklyAllowance,
    converter: &'a CurrencyConverter,
}

impl<'a> FeeEngine<'a> {
    pub fn new(
        fees: &'a FeeRates,
        allowance: &'a WeeklyAllowance,
        converter: &'a CurrencyConverter,
    ) -> Self {
        FeeEngine {
            fees,
            allowance,
            converter,
        }
    }

    /// Computes one fee per record, in input order.
    ///
    /// # Returns
    ///
    /// The fees of all records, or the first error encountered. There are no
    /// partial results: a single unsupported currency fails the whole batch.
    pub fn compute_fees(&self, records: &[Record]) -> Result<Vec<Fee>> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| self.compute_fee(&records[..i], record))
            .collect()
    }

    /// Computes the fee of `record`, given the records that precede it.
    fn compute_fee(&self, history: &[Record], record: &Record) -> Result<Fee> {
        let (amount, fees) = (record.amount, self.fees);

        let (taxable, percent) = match (record.entity_type, record.action) {
            (EntityType::Private, Action::Deposit) => (amount, fees.deposit_private),
            (EntityType::Business, Action::Deposit) => (amount, fees.deposit_business),
            (EntityType::Business, Action::Withdraw) => (amount, fees.withdraw_business),
            (EntityType::Private, Action::Withdraw) => {
                let taxable = self.taxable_withdrawal(history, record)?;
                (taxable, fees.withdraw_private)
            }
        };

        let raw = flat_fee(taxable, percent)?;
        let fee = Fee::round_up(raw, record.precision());
        trace!("Fee of {record:?}: {fee} (raw {raw}).");

        Ok(fee)
    }

    /// Part of a private withdrawal that is not covered by the weekly allowance.
    ///
    /// The allowance covers a number of withdrawals per ISO week up to a
    /// cumulative amount in base currency. Usage is taken from the client's
    /// earlier private withdrawals in the same week, where "earlier" means
    /// earlier in the batch, not earlier in time.
    fn taxable_withdrawal(&self, history: &[Record], record: &Record) -> Result<Amount> {
        let window = week_start(record.operation_date)..=record.operation_date;

        let mut withdrawals = 0;
        let mut withdrawn = Decimal::ZERO;

        for prior in history {
            if !prior.is_private_withdrawal()
                || prior.client_id != record.client_id
                || !window.contains(&prior.operation_date)
            {
                continue;
            }

            withdrawals += 1;
            let in_base = self.converter.to_base(&prior.currency, prior.amount)?;
            withdrawn = types::add(withdrawn, in_base)?;
        }

        if withdrawals >= self.allowance.free_withdrawals {
            return Ok(record.amount);
        }

        let remaining = types::non_negative(types::sub(self.allowance.free_amount, withdrawn)?);
        let free = self.converter.from_base(&record.currency, remaining)?;

        Ok(types::non_negative(types::sub(record.amount, free)?))
    }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

fn flat_fee(amount: Amount, percent: Decimal) -> Result<Amount> {
    types::mul(amount, FeeRates::fraction(percent)?)
}

/// Computes fee strings with the given configuration and a fixed rate table.
#[cfg(test)]
fn compute_fees_with(config: &crate::config::Config, records: &[Record]) -> Vec<String> {
    let converter = test_converter();
    FeeEngine::new(&config.fees, &config.allowance, &converter)
        .compute_fees(records)
        .unwrap()
        .iter()
        .map(Fee::to_string)
        .collect()
}

#[cfg(test)]
fn compute_fees_vec(records: &[Record]) -> Vec<String> {
    compute_fees_with(&crate::config::Config::default(), records)
}

#[cfg(test)]
fn test_converter() -> CurrencyConverter {
    use crate::rates::{ExchangeRates, tests::sample_table};
    CurrencyConverter::new("EUR", ExchangeRates::new(Box::new(sample_table())))
}

#[cfg(test)]
fn record(
    date: &str,
    client: &str,
    entity_type: EntityType,
    action: Action,
    amount: &str,
    currency: &str,
) -> Record {
    Record {
        operation_date: date.parse().unwrap(),
        client_id: client.to_string(),
        entity_type,
        action,
        amount: amount.parse().unwrap(),
        currency: currency.to_string(),
    }
}

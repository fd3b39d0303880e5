//! Conversion between the base currency and any other supported currency.

use crate::error::Result;
use crate::rates::ExchangeRates;
use crate::types::{self, Amount};

/// Converts amounts through the base currency.
///
/// Rates are only requested for non-base currencies, so a batch that never
/// leaves the base currency never touches the rate source.
pub struct CurrencyConverter {
    base: String,
    rates: ExchangeRates,
}

impl CurrencyConverter {
    /// Creates a converter for `base` backed by a lazily fetched rate table.
    pub fn new(base: &str, rates: ExchangeRates) -> Self {
        CurrencyConverter {
            base: base.to_string(),
            rates,
        }
    }

    /// Converts `amount` of `currency` into the base currency.
    ///
    /// # Arguments
    ///
    /// * `currency` - Currency the amount is denominated in
    /// * `amount` - Amount to convert
    ///
    /// # Returns
    ///
    /// The amount unchanged for the base currency, otherwise `amount / rate`
    /// truncated to the internal scale.
    ///
    /// # Errors
    ///
    /// - [`FeeError::UnsupportedCurrency`] if the rate table has no `currency`
    /// - [`FeeError::RateFetchFailed`] if the table had to be fetched and that failed
    ///
    /// [`FeeError::UnsupportedCurrency`]: crate::error::FeeError::UnsupportedCurrency
    /// [`FeeError::RateFetchFailed`]: crate::error::FeeError::RateFetchFailed
    pub fn to_base(&self, currency: &str, amount: Amount) -> Result<Amount> {
        if currency == self.base {
            return Ok(amount);
        }
        types::div(amount, self.rates.rate(currency)?)
    }

    /// Converts `amount` of the base currency into `currency`.
    ///
    /// The inverse of [`to_base`](Self::to_base): `amount * rate`, with the
    /// same errors.
    pub fn from_base(&self, currency: &str, amount: Amount) -> Result<Amount> {
        if currency == self.base {
            return Ok(amount);
        }
        types::mul(amount, self.rates.rate(currency)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeeError;
    use crate::rates::tests::{CountingProvider, sample_table};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cell::Cell;
    use std::rc::Rc;

    fn converter() -> (CurrencyConverter, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let provider = CountingProvider {
            table: sample_table(),
            calls: calls.clone(),
        };
        let rates = ExchangeRates::new(Box::new(provider));
        (CurrencyConverter::new("EUR", rates), calls)
    }

    #[test]
    fn base_currency_is_identity_without_fetch() {
        let (converter, calls) = converter();
        let to_base = |currency, amount| converter.to_base(currency, amount).unwrap();
        let from_base = |currency, amount| converter.from_base(currency, amount).unwrap();

        assert_eq!(to_base("EUR", dec!(1000.00)), dec!(1000.00));
        assert_eq!(from_base("EUR", dec!(12.345)), dec!(12.345));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn converts_through_rates() {
        let (converter, calls) = converter();
        let to_base = |currency, amount| converter.to_base(currency, amount).unwrap();
        let from_base = |currency, amount| converter.from_base(currency, amount).unwrap();

        assert_eq!(to_base("JPY", dec!(30000)), dec!(231.6065776268));
        assert_eq!(to_base("USD", dec!(100.00)), dec!(86.9792119683));
        assert_eq!(from_base("JPY", dec!(1000)), dec!(129530));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unknown_currency_fails() {
        let (converter, _) = converter();

        match converter.to_base("GBP", dec!(1)) {
            Err(FeeError::UnsupportedCurrency(currency)) => assert_eq!(currency, "GBP"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(converter.from_base("GBP", dec!(1)).is_err());
    }

    proptest! {
        #[test]
        fn round_trip_stays_within_scale(
            cents in 0i64..=1_000_000_000i64,
            currency in prop::sample::select(vec!["EUR", "JPY", "USD"]),
        ) {
            let (converter, _) = converter();
            let amount = Decimal::new(cents, 2);

            let in_base = converter.to_base(currency, amount).unwrap();
            let back = converter.from_base(currency, in_base).unwrap();

            // truncation at 10 digits loses at most one unit per step, scaled by the rate
            let tolerance = dec!(0.000000001) * dec!(130);
            prop_assert!((back - amount).abs() <= tolerance, "{} -> {}", amount, back);
        }
    }
}

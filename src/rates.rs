//! Exchange rates relative to the base currency.
//!
//! Rates are pulled from a [`RateProvider`] at most once per [`ExchangeRates`]
//! instance and then served from memory for the rest of the run.

use log::{debug, info};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::{FeeError, Result};
use crate::types::Currency;

/// Units of each currency equal to one unit of the base currency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeRateTable {
    rates: HashMap<Currency, Decimal>,
}

impl ExchangeRateTable {
    /// Parses a JSON body whose `rates` object maps currency codes to rates.
    ///
    /// # Arguments
    ///
    /// * `body` - Response body, e.g. `{"base":"EUR","rates":{"USD":1.1497}}`
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::RateFetchFailed`] if the body is not JSON, has no
    /// `rates` object, or any rate is not a positive number.
    pub fn from_json(body: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct Response {
            rates: HashMap<Currency, serde_json::Number>,
        }

        let response: Response = serde_json::from_str(body).map_err(fetch_failed)?;

        let mut rates = HashMap::with_capacity(response.rates.len());
        for (currency, rate) in response.rates {
            let rate = parse_rate(&currency, &rate.to_string())?;
            rates.insert(currency, rate);
        }

        Ok(ExchangeRateTable { rates })
    }

    /// Returns the rate of `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::UnsupportedCurrency`] if the table has no such currency.
    pub fn get(&self, currency: &str) -> Result<Decimal> {
        match self.rates.get(currency) {
            Some(rate) => Ok(*rate),
            None => Err(FeeError::UnsupportedCurrency(currency.to_string())),
        }
    }

    fn len(&self) -> usize {
        self.rates.len()
    }
}

impl<C: Into<Currency>> FromIterator<(C, Decimal)> for ExchangeRateTable {
    fn from_iter<I: IntoIterator<Item = (C, Decimal)>>(iter: I) -> Self {
        ExchangeRateTable {
            rates: iter.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }
}

fn parse_rate(currency: &str, text: &str) -> Result<Decimal> {
    let rate = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|e| fetch_failed(format!("bad {currency} rate: {e}")))?;

    if rate <= Decimal::ZERO {
        return Err(fetch_failed(format!("non-positive {currency} rate")));
    }

    Ok(rate)
}

fn fetch_failed<E: fmt::Display>(error: E) -> FeeError {
    FeeError::RateFetchFailed(error.to_string())
}

/// Source of the exchange rate table.
pub trait RateProvider {
    fn fetch(&self) -> Result<ExchangeRateTable>;
}

/// A preloaded table serves as its own provider.
impl RateProvider for ExchangeRateTable {
    fn fetch(&self) -> Result<ExchangeRateTable> {
        Ok(self.clone())
    }
}

/// Fetches the table with a single GET request to a JSON endpoint.
pub struct HttpRateProvider {
    client: Client,
    url: String,
}

impl HttpRateProvider {
    /// Creates a provider for the exchange rates endpoint.
    ///
    /// # Arguments
    ///
    /// * `url` - Endpoint answering `GET` with `{"rates": {"<code>": <rate>, ...}}`
    ///
    /// No request is sent until [`RateProvider::fetch`] is called.
    pub fn new(url: &str) -> Self {
        HttpRateProvider {
            client: Client::new(),
            url: url.to_string(),
        }
    }
}

impl RateProvider for HttpRateProvider {
    /// Sends one `GET` with `Accept: application/json` and parses the body.
    ///
    /// Only `200 OK` with a non-empty body is accepted; anything else is a
    /// [`FeeError::RateFetchFailed`]. There are no retries.
    fn fetch(&self) -> Result<ExchangeRateTable> {
        let url = &self.url;

        debug!("Sending request to {url}...");
        let start = Instant::now();
        let request = self.client.get(url).header(ACCEPT, "application/json");
        let response = request.send().map_err(fetch_failed)?;
        debug!("Got response from {url} ({:?}).", start.elapsed());

        let status = response.status();
        if status != StatusCode::OK {
            return Err(fetch_failed(format!("{url} returned {status}")));
        }

        let body = response.text().map_err(fetch_failed)?;
        if body.trim().is_empty() {
            return Err(fetch_failed(format!("{url} returned an empty response")));
        }

        ExchangeRateTable::from_json(&body)
    }
}

/// Lazily fetched, then read-only, exchange rate table.
///
/// The table moves from unfetched to fetched exactly once; a failed fetch
/// leaves it unfetched and is reported to the caller.
pub struct ExchangeRates {
    provider: Box<dyn RateProvider>,
    table: OnceCell<ExchangeRateTable>,
}

impl ExchangeRates {
    /// Wraps `provider` without fetching anything yet.
    pub fn new(provider: Box<dyn RateProvider>) -> Self {
        ExchangeRates {
            provider,
            table: OnceCell::new(),
        }
    }

    /// Returns the cached table, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns whatever the provider fails with on the first fetch, normally
    /// [`FeeError::RateFetchFailed`].
    pub fn rates(&self) -> Result<&ExchangeRateTable> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }

        let table = self.provider.fetch()?;
        info!("Loaded {} exchange rates.", table.len());
        Ok(self.table.get_or_init(|| table))
    }

    /// Returns the rate of `currency` against the base currency.
    ///
    /// # Arguments
    ///
    /// * `currency` - Currency code to look up
    ///
    /// # Errors
    ///
    /// - [`FeeError::RateFetchFailed`] if the table could not be fetched
    /// - [`FeeError::UnsupportedCurrency`] if the table has no such currency
    pub fn rate(&self, currency: &str) -> Result<Decimal> {
        self.rates()?.get(currency)
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Provider that counts how many times it was asked for the table.
    pub(crate) struct CountingProvider {
        pub table: ExchangeRateTable,
        pub calls: Rc<Cell<usize>>,
    }

    impl RateProvider for CountingProvider {
        fn fetch(&self) -> Result<ExchangeRateTable> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.table.clone())
        }
    }

    struct FailingProvider;

    impl RateProvider for FailingProvider {
        fn fetch(&self) -> Result<ExchangeRateTable> {
            Err(FeeError::RateFetchFailed("unreachable".to_string()))
        }
    }

    pub(crate) fn sample_table() -> ExchangeRateTable {
        ExchangeRateTable::from_iter([
            ("EUR", dec!(1)),
            ("JPY", dec!(129.53)),
            ("USD", dec!(1.1497)),
        ])
    }

    const SAMPLE_BODY: &str = r#"{"base":"EUR","rates":{"EUR":1,"JPY":129.53,"USD":1.1497}}"#;

    fn provider(server: &mockito::Server) -> HttpRateProvider {
        HttpRateProvider::new(&format!("{}/rates", server.url()))
    }

    #[test]
    fn parse_rates_body() {
        let table = ExchangeRateTable::from_json(SAMPLE_BODY).unwrap();
        assert_eq!(table, sample_table());
        assert_eq!(table.get("JPY").unwrap(), dec!(129.53));
    }

    #[test]
    fn parse_rejects_missing_rates() {
        let result = ExchangeRateTable::from_json(r#"{"base":"EUR"}"#);
        assert!(matches!(result, Err(FeeError::RateFetchFailed(_))));

        let result = ExchangeRateTable::from_json("not json");
        assert!(matches!(result, Err(FeeError::RateFetchFailed(_))));
    }

    #[test]
    fn parse_rejects_non_positive_rate() {
        let result = ExchangeRateTable::from_json(r#"{"rates":{"USD":0}}"#);
        assert!(matches!(result, Err(FeeError::RateFetchFailed(_))));
    }

    #[test]
    fn missing_currency_is_unsupported() {
        match sample_table().get("GBP") {
            Err(FeeError::UnsupportedCurrency(currency)) => assert_eq!(currency, "GBP"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rates_are_fetched_once() {
        let calls = Rc::new(Cell::new(0));
        let provider = CountingProvider {
            table: sample_table(),
            calls: calls.clone(),
        };
        let rates = ExchangeRates::new(Box::new(provider));

        assert!(!rates.is_loaded());
        assert_eq!(rates.rate("USD").unwrap(), dec!(1.1497));
        assert_eq!(rates.rate("JPY").unwrap(), dec!(129.53));
        assert!(rates.rate("GBP").is_err());
        assert!(rates.is_loaded());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fetch_failure_is_propagated() {
        let rates = ExchangeRates::new(Box::new(FailingProvider));

        let result = rates.rate("USD");
        assert!(matches!(result, Err(FeeError::RateFetchFailed(_))));
        assert!(!rates.is_loaded());
    }

    #[test]
    fn http_provider_fetches_rates() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/rates")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SAMPLE_BODY)
            .create();

        let table = provider(&server).fetch().unwrap();

        mock.assert();
        assert_eq!(table, sample_table());
    }

    #[test]
    fn http_provider_rejects_error_status() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/rates")
            .with_status(503)
            .with_body(SAMPLE_BODY)
            .create();

        let result = provider(&server).fetch();
        assert!(matches!(result, Err(FeeError::RateFetchFailed(_))));
    }

    #[test]
    fn http_provider_rejects_non_ok_success() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/rates").with_status(204).create();

        let result = provider(&server).fetch();
        assert!(matches!(result, Err(FeeError::RateFetchFailed(_))));
    }

    #[test]
    fn http_provider_rejects_empty_body() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/rates").with_status(200).create();

        let result = provider(&server).fetch();
        assert!(matches!(result, Err(FeeError::RateFetchFailed(_))));
    }
}

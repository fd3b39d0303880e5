//! Commission fee calculator.
//!
//! This program reads a file of operations, computes the commission fee of
//! each one and prints the fees to stdout, one per line, in input order.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- input.csv
//! ```
//!
//! # Input Format
//!
//! Headerless comma-separated rows with the columns:
//! - operation date (`YYYY-MM-DD`)
//! - client id
//! - client type (`private` or `business`)
//! - operation type (`deposit` or `withdraw`)
//! - amount (decimal, its fractional digits set the precision of the fee)
//! - currency (`EUR`, or any currency known to the exchange rates API)
//!
//! # Environment
//!
//! - `COMMISSION_FEES_RATES_URL`: exchange rates endpoint
//! - `COMMISSION_FEES_LOG_LEVEL`: `error`, `warn`, `info`, `debug` or `trace`
//!
//! On any error a single message is logged to stderr and no fees are printed.
use anyhow::{Context, Result};
use log::error;
use std::env;
use std::process::ExitCode;

use commission_fees::config::Config;
use commission_fees::converter::CurrencyConverter;
use commission_fees::engine::FeeEngine;
use commission_fees::io;
use commission_fees::rates::{ExchangeRates, HttpRateProvider};
use commission_fees::types::Record;

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(err) = easy_logging::init(module_path!(), config.log_level) {
        eprintln!("Failed to initialize the logging: {err}.");
        return ExitCode::FAILURE;
    }

    if let Err(err) = run(&config) {
        error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Runs the whole pipeline: records -> fees -> stdout.
///
/// Fees are only printed once every record has been processed, so a failure
/// anywhere leaves stdout empty.
fn run(config: &Config) -> Result<()> {
    let path = env::args().nth(1).context("Missing input file!")?;

    let records = io::read_records_from_file(&path, config.delimiter)?
        .collect::<Result<Vec<Record>, _>>()
        .with_context(|| format!("Failed to read {}", path))?;

    let rates = ExchangeRates::new(Box::new(HttpRateProvider::new(&config.rates_url)));
    let converter = CurrencyConverter::new(&config.base_currency, rates);
    let engine = FeeEngine::new(&config.fees, &config.allowance, &converter);

    let fees = engine.compute_fees(&records)?;
    io::write_fees_to_stdout(&fees)?;

    Ok(())
}

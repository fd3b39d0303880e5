//! Error taxonomy for fee computation.
//!
//! Every failure is fatal for the batch: errors are raised where they are
//! detected and propagated to the process boundary, which reports the message
//! and prints no fees.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeeError {
    /// The input source is missing or unreadable.
    #[error("Failed to open input file {path}")]
    InputUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A row of the input could not be turned into a record.
    #[error("Failed to parse record at line {line}")]
    MalformedRecord {
        line: usize,
        #[source]
        source: csv::Error,
    },

    /// A currency is absent from the exchange rate table.
    #[error("Currency {0} is not supported by the exchange rates API")]
    UnsupportedCurrency(String),

    /// The exchange rate service could not be queried or its answer was unusable.
    #[error("Error getting exchange rates: {0}")]
    RateFetchFailed(String),

    #[error("Decimal overflow in {0}")]
    Overflow(&'static str),

    #[error("Failed to write fees")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeeError>;

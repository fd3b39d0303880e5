//! Input/Output operations for fee computation.
//!
//! This module provides functions for reading operation records from
//! delimited text files and writing the computed fees to standard output.

use std::fs::File;
use std::io::{self, Read, Write};

use crate::error::{FeeError, Result};
use crate::types::{Fee, Record};

/// An iterator over records from delimited text.
///
/// Records are parsed lazily, one line at a time. Errors name the 1-based
/// line of the offending row.
pub struct RecordReader<R: Read> {
    reader: csv::Reader<R>,
    line_num: usize,
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.deserialize().next().map(|result| {
            self.line_num += 1;
            let line = self.line_num;
            result.map_err(|source| FeeError::MalformedRecord { line, source })
        })
    }
}

/// Reads headerless records of six fields from any reader.
///
/// # Arguments
///
/// * `reader` - Source of the delimited text
/// * `delimiter` - Field separator, usually `b','`
///
/// # Returns
///
/// An iterator yielding one [`Record`] per line. Fields are
/// `date, client id, entity type, action, amount, currency`, trimmed of
/// surrounding whitespace.
pub fn read_records<R: Read>(reader: R, delimiter: u8) -> RecordReader<R> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    RecordReader {
        reader,
        line_num: 0,
    }
}

/// Opens the file at `path` and returns an iterator over its records.
///
/// # Errors
///
/// Returns [`FeeError::InputUnavailable`] if the file cannot be opened.
/// Individual record parsing errors are returned when iterating over the result.
pub fn read_records_from_file(path: &str, delimiter: u8) -> Result<RecordReader<File>> {
    let file = File::open(path).map_err(|source| FeeError::InputUnavailable {
        path: path.to_string(),
        source,
    })?;

    Ok(read_records(file, delimiter))
}

/// Writes each fee on its own line and flushes the writer.
///
/// # Arguments
///
/// * `writer` - Destination of the report
/// * `fees` - Fees in input order
///
/// # Errors
///
/// Returns [`FeeError::Output`] if writing or flushing fails.
pub fn write_fees<W: Write>(mut writer: W, fees: &[Fee]) -> Result<()> {
    for fee in fees {
        writeln!(writer, "{}", fee)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes each fee on its own line to stdout.
///
/// # Errors
///
/// Returns [`FeeError::Output`] if stdout is closed or cannot be written.
pub fn write_fees_to_stdout(fees: &[Fee]) -> Result<()> {
    let stdout = io::stdout();
    write_fees(io::BufWriter::new(stdout.lock()), fees)
}

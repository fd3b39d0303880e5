//! Commission fees for deposits and withdrawals of private and business clients.
//!
//! The [`engine::FeeEngine`] computes one fee per record of an ordered batch.
//! Deposits and business withdrawals pay a flat rate; private withdrawals get
//! a weekly free allowance tracked in the base currency, with other currencies
//! converted through exchange rates fetched once per run.

pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod io;
pub mod rates;
pub mod types;

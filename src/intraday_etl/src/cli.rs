//! Command-line surface of the `intraday-etl` binary.

pub mod commands;
pub mod logging;

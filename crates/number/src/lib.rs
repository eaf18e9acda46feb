//! Conversions between human readable amounts and the integer
//! denominations used on chain.

pub mod units;

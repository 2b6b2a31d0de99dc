//! Exact decimal arithmetic for progress aggregation.
//!
//! All persisted aggregates (subtask targets, log deltas, daily totals) are
//! `rust_decimal::Decimal` values round-tripped through canonical strings,
//! so folding hundreds of small deltas and comparing against a target never
//! picks up binary floating-point error. Conversion to `f64` happens only
//! at the presentation boundary, after any decisive comparison.

use crate::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Exact addition.
pub fn add(a: Decimal, b: Decimal) -> Decimal {
    a + b
}

/// Exact `a >= b` at decimal scale.
pub fn gte(a: Decimal, b: Decimal) -> bool {
    a >= b
}

/// Parse a canonical decimal string.
pub fn parse(value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|_| Error::Validation(format!("not a decimal value: {value:?}")))
}

/// Convert a caller-supplied float, rejecting non-finite input before it
/// can reach the log.
pub fn from_f64(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(Error::Validation(format!("non-finite delta: {value}")));
    }
    Decimal::from_f64_retain(value)
        .ok_or_else(|| Error::Validation(format!("unrepresentable delta: {value}")))
}

/// Presentation-boundary conversion to an approximate type.
pub fn to_display(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

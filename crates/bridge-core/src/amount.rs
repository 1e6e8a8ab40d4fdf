//! Decimal ⇄ integer base-unit conversion.
//!
//! Scaling is exact `Decimal` multiplication by `10^decimals`, rounded to the
//! nearest integer (midpoint away from zero), then narrowed with overflow
//! checks.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::ValidationError;

pub const SOL_DECIMALS: u32 = 9;
pub const XRD_DECIMALS: u32 = 18;
/// Rates are stored in basis points.
pub const RATE_DECIMALS: u32 = 4;
/// Prices and premiums are stored at 10^8.
pub const PRICE_DECIMALS: u32 = 8;

fn scaled(value: Decimal, decimals: u32) -> Result<Decimal, ValidationError> {
    let factor = Decimal::from(10u64.pow(decimals));
    value
        .checked_mul(factor)
        .map(|v| v.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| {
            ValidationError::InvalidAmount(format!("{value} overflows at 10^{decimals}"))
        })
}

/// `value × 10^decimals` as an unsigned integer. Negative values are rejected.
pub fn to_base_units(value: Decimal, decimals: u32) -> Result<u64, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::InvalidAmount(format!("{value} is negative")));
    }
    scaled(value, decimals)?
        .to_u64()
        .ok_or_else(|| ValidationError::InvalidAmount(format!("{value} does not fit in u64")))
}

/// `value × 10^decimals` as a signed integer.
pub fn to_signed_units(value: Decimal, decimals: u32) -> Result<i64, ValidationError> {
    scaled(value, decimals)?
        .to_i64()
        .ok_or_else(|| ValidationError::InvalidAmount(format!("{value} does not fit in i64")))
}

pub fn from_base_units(units: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(units as i128, decimals).normalize()
}

pub fn from_signed_units(units: i64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(units as i128, decimals).normalize()
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    from_base_units(lamports, SOL_DECIMALS)
}

pub fn sol_to_lamports(sol: Decimal) -> Result<u64, ValidationError> {
    to_base_units(sol, SOL_DECIMALS)
}

/// Render an XRD amount for a manifest: rounded to 18 places, no trailing
/// zeros, never negative.
pub fn to_xrd_string(value: Decimal) -> Result<String, ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::InvalidAmount(format!("{value} is negative")));
    }
    Ok(value
        .round_dp_with_strategy(XRD_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string())
}

/// Transfer amounts must be strictly positive.
pub fn require_positive(value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount(format!("{value} must be greater than zero")));
    }
    Ok(())
}

//! Exact conversions between human amounts and integer base units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::CoreError::{
  self, AmountBelowPrecision, AmountOverflow, NonPositiveAmount,
};
use crate::tokens::NATIVE_DECIMALS;

/// `10^decimals` as a `Decimal`.
fn unit_scale(decimals: u32) -> Result<Decimal, CoreError> {
  10u64
    .checked_pow(decimals)
    .map(Decimal::from)
    .ok_or(AmountOverflow { decimals })
}

/// Converts a human amount into base units at the given exponent.
///
/// Digits beyond the asset's precision are truncated, so the loss is always
/// below one base unit and the result never exceeds the requested amount.
///
/// # Errors
/// * Amount is zero or negative
/// * Amount truncates to zero base units
/// * Scaled amount does not fit in `u64`
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<u64, CoreError> {
  if amount <= Decimal::ZERO {
    return Err(NonPositiveAmount);
  }
  let base = amount
    .checked_mul(unit_scale(decimals)?)
    .ok_or(AmountOverflow { decimals })?
    .trunc()
    .to_u64()
    .ok_or(AmountOverflow { decimals })?;
  if base == 0 {
    Err(AmountBelowPrecision { decimals })
  } else {
    Ok(base)
  }
}

/// Converts integer base units back into a human amount.
///
/// # Errors
/// * Exponent beyond `Decimal`'s maximum scale
pub fn from_base_units(raw: u64, decimals: u32) -> Result<Decimal, CoreError> {
  Decimal::try_from_i128_with_scale(i128::from(raw), decimals)
    .map(|amount| amount.normalize())
    .map_err(|_| AmountOverflow { decimals })
}

/// Lamports to SOL.
///
/// # Errors
/// * Never for the native exponent; kept fallible to match [`from_base_units`]
pub fn lamports_to_sol(lamports: u64) -> Result<Decimal, CoreError> {
  from_base_units(lamports, NATIVE_DECIMALS)
}

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::CoreError::{
  self, InvalidSlippagePercent, SlippageOutOfRange,
};

pub const MIN_SLIPPAGE_BPS: u16 = 10;
pub const MAX_SLIPPAGE_BPS: u16 = 500;
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

const BPS_DENOMINATOR: u128 = 10_000;

/// Client specified slippage tolerance in basis points, bounded to
/// `[MIN_SLIPPAGE_BPS, MAX_SLIPPAGE_BPS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlippageBps(u16);

impl SlippageBps {
  pub fn new(bps: u16) -> Result<SlippageBps, CoreError> {
    if (MIN_SLIPPAGE_BPS..=MAX_SLIPPAGE_BPS).contains(&bps) {
      Ok(SlippageBps(bps))
    } else {
      Err(SlippageOutOfRange(bps))
    }
  }

  /// Builds the tolerance from a percentage, e.g. `0.5` is 50 bps.
  /// Fractions of a basis point are dropped.
  ///
  /// # Errors
  /// * Negative percentage or one too large for basis points
  /// * Resulting tolerance outside the accepted range
  pub fn from_percent(percent: Decimal) -> Result<SlippageBps, CoreError> {
    let bps = percent
      .checked_mul(Decimal::ONE_HUNDRED)
      .map(|bps| bps.trunc())
      .and_then(|bps| bps.to_u16())
      .ok_or(InvalidSlippagePercent(percent))?;
    SlippageBps::new(bps)
  }

  #[must_use]
  pub const fn bps(self) -> u16 {
    self.0
  }

  /// Lowest output amount tolerable for an expected amount.
  #[must_use]
  pub fn min_amount_out(self, expected: u64) -> u64 {
    let factor = BPS_DENOMINATOR - u128::from(self.0);
    let min = u128::from(expected) * factor / BPS_DENOMINATOR;
    // `factor <= BPS_DENOMINATOR` so the result never exceeds `expected`
    u64::try_from(min).unwrap_or(expected)
  }
}

impl Default for SlippageBps {
  fn default() -> Self {
    SlippageBps(DEFAULT_SLIPPAGE_BPS)
  }
}

impl TryFrom<u16> for SlippageBps {
  type Error = CoreError;

  fn try_from(bps: u16) -> Result<SlippageBps, CoreError> {
    SlippageBps::new(bps)
  }
}

impl std::fmt::Display for SlippageBps {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} bps", self.0)
  }
}

use anchor_lang::prelude::Pubkey;

use crate::error::CoreError::{self, FeeOutOfRange};

/// Platform fee charged through the aggregator.
///
/// The fee is only forwarded when a fee account is configured; a bare
/// `fee_bps` with no account is inert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformFee {
  pub fee_bps: u16,
  pub fee_account: Option<Pubkey>,
}

impl PlatformFee {
  pub const NONE: PlatformFee = PlatformFee {
    fee_bps: 0,
    fee_account: None,
  };

  pub fn new(
    fee_bps: u16,
    fee_account: Option<Pubkey>,
  ) -> Result<PlatformFee, CoreError> {
    let fee = PlatformFee {
      fee_bps,
      fee_account,
    };
    fee.validate()?;
    Ok(fee)
  }

  /// Account and rate to forward, if any.
  #[must_use]
  pub fn active(&self) -> Option<(u16, Pubkey)> {
    self.fee_account.map(|account| (self.fee_bps, account))
  }

  /// Fee must stay below 100%.
  pub fn validate(&self) -> Result<(), CoreError> {
    if self.fee_bps < 10_000 {
      Ok(())
    } else {
      Err(FeeOutOfRange(self.fee_bps))
    }
  }
}

use anchor_lang::prelude::Pubkey;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
  // `amount`
  #[error("Amount must be greater than zero.")]
  NonPositiveAmount,
  #[error("Amount is smaller than one base unit at {decimals} decimals.")]
  AmountBelowPrecision { decimals: u32 },
  #[error("Amount does not fit in base units at {decimals} decimals.")]
  AmountOverflow { decimals: u32 },
  // `slippage_config`
  #[error("Slippage tolerance of {0} bps is outside the accepted range.")]
  SlippageOutOfRange(u16),
  #[error("Slippage of {0}% is not a valid tolerance.")]
  InvalidSlippagePercent(Decimal),
  // `fee_config`
  #[error("Platform fee of {0} bps must be below 100%.")]
  FeeOutOfRange(u16),
  // `envelope`
  #[error("Transaction payload is not valid base64: {0}")]
  EnvelopeEncoding(String),
  #[error("Transaction payload is empty.")]
  EmptyEnvelope,
  // `token_account`
  #[error("Token account data is {0} bytes, shorter than the account layout.")]
  TokenAccountLength(usize),
  #[error("Token account data could not be unpacked: {0}")]
  TokenAccountUnpack(String),
  // `tokens`
  #[error("{0} is not a known token.")]
  UnknownToken(Pubkey),
}

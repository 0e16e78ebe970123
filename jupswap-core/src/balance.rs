//! Wallet balance snapshot and the multi-account selection rule.

use rust_decimal::Decimal;
use thiserror::Error;

/// How much of a snapshot could be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceStatus {
  /// Native and token balances are both known.
  Complete,
  /// Native balance known, token balance unavailable. Only produced when
  /// the resolver is limited to a single token strategy; with the default
  /// fallback list a token failure is reported as `Failed`.
  Partial,
  /// Native balance unavailable, or every token fallback strategy failed.
  Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceQueryError {
  #[error("Native balance query failed: {0}")]
  Native(String),
  #[error("Token balance query failed: {0}")]
  Token(String),
}

/// Result of a single balance resolution. Superseded, never merged, by the
/// next resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
  pub native_amount: Option<Decimal>,
  pub token_amount: Option<Decimal>,
  pub status: BalanceStatus,
  pub error: Option<BalanceQueryError>,
}

impl BalanceSnapshot {
  #[must_use]
  pub fn complete(native_amount: Decimal, token_amount: Decimal) -> Self {
    BalanceSnapshot {
      native_amount: Some(native_amount),
      token_amount: Some(token_amount),
      status: BalanceStatus::Complete,
      error: None,
    }
  }

  #[must_use]
  pub fn partial(native_amount: Decimal, error: BalanceQueryError) -> Self {
    BalanceSnapshot {
      native_amount: Some(native_amount),
      token_amount: None,
      status: BalanceStatus::Partial,
      error: Some(error),
    }
  }

  /// Native balance resolved but every token strategy failed. `error`
  /// carries the primary strategy's failure.
  #[must_use]
  pub fn token_exhausted(
    native_amount: Decimal,
    error: BalanceQueryError,
  ) -> Self {
    BalanceSnapshot {
      native_amount: Some(native_amount),
      token_amount: None,
      status: BalanceStatus::Failed,
      error: Some(error),
    }
  }

  #[must_use]
  pub fn failed(error: BalanceQueryError) -> Self {
    BalanceSnapshot {
      native_amount: None,
      token_amount: None,
      status: BalanceStatus::Failed,
      error: Some(error),
    }
  }
}

/// Selects the balance to report when an owner holds several accounts for
/// the same mint: the largest one. No accounts means a zero balance.
pub fn max_balance<I>(amounts: I) -> Decimal
where
  I: IntoIterator<Item = Decimal>,
{
  amounts.into_iter().fold(Decimal::ZERO, Decimal::max)
}

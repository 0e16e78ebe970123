//! Error taxonomy of the swap pipeline.
//!
//! Every stage has its own error type; [`SwapError`] wraps them so the caller
//! always sees which stage failed.

use std::time::Duration;

use anchor_client::solana_sdk::signature::Signature;
use anchor_lang::prelude::Pubkey;
use jupswap_core::error::CoreError;
use thiserror::Error;

/// Failure to obtain a usable quote.
#[derive(Debug, Error)]
pub enum QuoteError {
  #[error("Invalid quote amount: {0}")]
  Amount(#[from] CoreError),
  #[error("Aggregator rejected quote request ({status}): {message}")]
  Rejected { status: u16, message: String },
  #[error("Quote request failed: {0}")]
  Transport(String),
  #[error("Malformed quote response: {0}")]
  Malformed(String),
  #[error("Quote response contains no route.")]
  NoRoute,
  #[error("Quote is for {actual}, requested {expected}.")]
  MintMismatch { expected: Pubkey, actual: Pubkey },
}

/// Failure to turn a quote into a signable transaction.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("Aggregator rejected swap request ({status}): {message}")]
  Rejected { status: u16, message: String },
  #[error("Swap request failed: {0}")]
  Transport(String),
  #[error("Malformed swap response: {0}")]
  Malformed(String),
  #[error("Undecodable swap transaction: {0}")]
  Envelope(#[from] CoreError),
}

/// Failure inside the external signer, including user rejection.
#[derive(Debug, Error)]
pub enum SigningError {
  #[error("Signer rejected the transaction: {0}")]
  Rejected(String),
  #[error("Signer failed: {0}")]
  Failed(String),
  #[error("Signer returned no signed transaction.")]
  Empty,
}

/// Node refused the signed transaction.
#[derive(Debug, Error)]
#[error("Transaction rejected by node: {message}")]
pub struct BroadcastError {
  pub message: String,
}

#[derive(Debug, Error)]
pub enum SwapError {
  #[error("Invalid swap request: {0}")]
  InvalidRequest(#[from] CoreError),
  #[error("A swap for {0} is already in flight.")]
  SwapInFlight(Pubkey),
  #[error(transparent)]
  Quote(#[from] QuoteError),
  #[error(transparent)]
  Build(#[from] BuildError),
  #[error(transparent)]
  Signing(#[from] SigningError),
  #[error(transparent)]
  Broadcast(#[from] BroadcastError),
  /// The transaction may still land; do not resubmit the same bytes.
  #[error(
    "Transaction {signature} not confirmed within {timeout:?}; outcome unknown."
  )]
  ConfirmationTimeout {
    signature: Signature,
    timeout: Duration,
  },
  #[error("Transaction {signature} failed on-chain: {reason}")]
  TransactionFailed { signature: Signature, reason: String },
}

impl SwapError {
  /// Whether the transaction may have settled despite the error.
  #[must_use]
  pub fn is_outcome_unknown(&self) -> bool {
    matches!(self, SwapError::ConfirmationTimeout { .. })
  }

  /// Whether a new attempt must start from a fresh quote. Quotes and
  /// blockhashes age out once any stage past quoting has failed.
  #[must_use]
  pub fn requires_fresh_quote(&self) -> bool {
    !matches!(
      self,
      SwapError::InvalidRequest(_)
        | SwapError::SwapInFlight(_)
        | SwapError::Quote(_)
    )
  }

  /// Signature of the submitted transaction, when one exists.
  #[must_use]
  pub fn signature(&self) -> Option<Signature> {
    match self {
      SwapError::ConfirmationTimeout { signature, .. }
      | SwapError::TransactionFailed { signature, .. } => Some(*signature),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timeout_is_unknown_not_failed() {
    let err = SwapError::ConfirmationTimeout {
      signature: Signature::default(),
      timeout: Duration::from_secs(60),
    };
    assert!(err.is_outcome_unknown());
    assert!(err.requires_fresh_quote());
    assert_eq!(err.signature(), Some(Signature::default()));
  }

  #[test]
  fn broadcast_is_a_failure() {
    let err = SwapError::from(BroadcastError {
      message: "Blockhash not found".into(),
    });
    assert!(!err.is_outcome_unknown());
    assert!(err.requires_fresh_quote());
    assert_eq!(err.signature(), None);
  }

  #[test]
  fn quote_failure_is_not_past_quoting() {
    let err = SwapError::from(QuoteError::NoRoute);
    assert!(!err.requires_fresh_quote());
  }
}

use anchor_lang::prelude::Pubkey;
use jupswap_core::envelope::TransactionEnvelope;
use jupswap_core::fee_config::PlatformFee;
use serde_json::Value;
use tracing::debug;

use crate::aggregator::{AggregatorApi, SwapTransactionRequest};
use crate::error::BuildError;
use crate::quote_resolver::Quote;

impl SwapTransactionRequest {
  /// Swap body for a quote. Native SOL is always wrapped and unwrapped; the
  /// destination and fee fields are only present when set.
  #[must_use]
  pub fn new(
    route: Value,
    requester: Pubkey,
    destination: Option<Pubkey>,
    platform_fee: PlatformFee,
  ) -> SwapTransactionRequest {
    let fee = platform_fee.active();
    SwapTransactionRequest {
      quote_response: route,
      user_public_key: requester.to_string(),
      wrap_and_unwrap_sol: true,
      destination_wallet: destination.map(|wallet| wallet.to_string()),
      platform_fee_bps: fee.map(|(bps, _)| bps),
      fee_account: fee.map(|(_, account)| account.to_string()),
    }
  }
}

/// Converts quotes into unsigned transaction envelopes.
#[derive(Clone)]
pub struct TransactionBuilder<A> {
  aggregator: A,
  platform_fee: PlatformFee,
}

impl<A: AggregatorApi> TransactionBuilder<A> {
  #[must_use]
  pub fn new(aggregator: A, platform_fee: PlatformFee) -> TransactionBuilder<A> {
    TransactionBuilder {
      aggregator,
      platform_fee,
    }
  }

  /// Requests the swap transaction for `quote`, paid and signed by
  /// `requester`. Output goes to `destination` when given, otherwise back to
  /// the requester.
  ///
  /// # Errors
  /// * Aggregator rejection or transport failure
  /// * Response lacks a decodable transaction
  pub async fn build_signable_transaction(
    &self,
    quote: &Quote,
    requester: Pubkey,
    destination: Option<Pubkey>,
  ) -> Result<TransactionEnvelope, BuildError> {
    let request = SwapTransactionRequest::new(
      quote.route().clone(),
      requester,
      destination,
      self.platform_fee,
    );
    let response = self.aggregator.swap_transaction(&request).await?;
    let envelope =
      TransactionEnvelope::decode_base64(&response.swap_transaction)?;
    debug!(
      kind = %envelope.kind(),
      bytes = envelope.payload().len(),
      last_valid_block_height = ?response.last_valid_block_height,
      "Swap transaction built"
    );
    Ok(envelope)
  }
}

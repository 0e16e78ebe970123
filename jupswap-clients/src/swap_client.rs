use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use anyhow::Result;
use dashmap::DashSet;
use jupswap_core::balance::BalanceSnapshot;
use jupswap_core::error::CoreError;
use jupswap_core::slippage_config::SlippageBps;
use jupswap_core::tokens::{Asset, TokenMint, USDC, WSOL};
use rust_decimal::Decimal;
use tracing::info;

use crate::aggregator::{AggregatorApi, JupiterClient};
use crate::balance_resolver::BalanceResolver;
use crate::config::SwapConfig;
use crate::error::SwapError;
use crate::quote_resolver::QuoteResolver;
use crate::rpc::{RpcProvider, SolanaRpcProvider};
use crate::signer::TransactionSigner;
use crate::submission::{SubmissionCoordinator, SubmissionResult};
use crate::transaction_builder::TransactionBuilder;

/// Everything needed to execute one exact-in swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
  pub source_asset: Asset,
  pub destination_asset: Asset,
  /// Human units of the source asset.
  pub source_amount: Decimal,
  pub slippage: SlippageBps,
  /// Pays fees, signs, and provides the input.
  pub requester: Pubkey,
  /// Receives the output instead of the requester when set.
  pub recipient: Option<Pubkey>,
}

impl SwapRequest {
  /// Request at the default slippage, paying out to the requester.
  #[must_use]
  pub fn new(
    source_asset: Asset,
    destination_asset: Asset,
    source_amount: Decimal,
    requester: Pubkey,
  ) -> SwapRequest {
    SwapRequest {
      source_asset,
      destination_asset,
      source_amount,
      slippage: SlippageBps::default(),
      requester,
      recipient: None,
    }
  }

  /// USDC to native SOL, the pipeline's primary pair.
  #[must_use]
  pub fn usdc_to_sol(amount: Decimal, requester: Pubkey) -> SwapRequest {
    SwapRequest::new(USDC::asset(), WSOL::asset(), amount, requester)
  }

  #[must_use]
  pub fn with_slippage(mut self, slippage: SlippageBps) -> SwapRequest {
    self.slippage = slippage;
    self
  }

  #[must_use]
  pub fn with_recipient(mut self, recipient: Option<Pubkey>) -> SwapRequest {
    self.recipient = recipient;
    self
  }

  /// Checks the amount is positive. Precision against the source asset is
  /// checked when quoting.
  ///
  /// # Errors
  /// * Amount zero or negative
  pub fn validate(&self) -> Result<(), CoreError> {
    if self.source_amount > Decimal::ZERO {
      Ok(())
    } else {
      Err(CoreError::NonPositiveAmount)
    }
  }
}

/// Marks a requester busy for the lifetime of one swap.
struct InFlightGuard<'a> {
  in_flight: &'a DashSet<Pubkey>,
  requester: Pubkey,
}

impl<'a> InFlightGuard<'a> {
  fn acquire(
    in_flight: &'a DashSet<Pubkey>,
    requester: Pubkey,
  ) -> Result<InFlightGuard<'a>, SwapError> {
    if in_flight.insert(requester) {
      Ok(InFlightGuard {
        in_flight,
        requester,
      })
    } else {
      Err(SwapError::SwapInFlight(requester))
    }
  }
}

impl Drop for InFlightGuard<'_> {
  fn drop(&mut self) {
    self.in_flight.remove(&self.requester);
  }
}

/// Quote, build, sign, submit, and balance refresh behind one client.
///
/// At most one swap per requester runs at a time; a second request for the
/// same requester fails fast with [`SwapError::SwapInFlight`].
pub struct SwapClient<A, R> {
  quotes: QuoteResolver<A>,
  builder: TransactionBuilder<A>,
  coordinator: SubmissionCoordinator<R>,
  balances: BalanceResolver<R>,
  default_slippage: SlippageBps,
  in_flight: DashSet<Pubkey>,
}

impl SwapClient<Arc<JupiterClient>, Arc<SolanaRpcProvider>> {
  /// Jupiter and Solana RPC clients built from `config`, tracking the
  /// USDC balance.
  ///
  /// # Errors
  /// * HTTP client construction
  /// * Invalid fee or slippage configuration
  pub fn from_config(config: &SwapConfig) -> Result<Self> {
    let aggregator = Arc::new(JupiterClient::from_config(config)?);
    let rpc = Arc::new(SolanaRpcProvider::from_url(config.rpc_url.clone()));
    SwapClient::new(aggregator, rpc, USDC::asset(), config)
  }
}

impl<A, R> SwapClient<A, R>
where
  A: AggregatorApi + Clone,
  R: RpcProvider + Clone,
{
  /// # Errors
  /// * Invalid fee configuration
  /// * Default slippage outside the accepted range
  pub fn new(
    aggregator: A,
    rpc: R,
    balance_token: Asset,
    config: &SwapConfig,
  ) -> Result<Self> {
    Ok(SwapClient {
      quotes: QuoteResolver::new(aggregator.clone()),
      builder: TransactionBuilder::new(aggregator, config.platform_fee()?),
      coordinator: SubmissionCoordinator::new(
        rpc.clone(),
        config.confirmation_timeout(),
        config.confirmation_poll_interval(),
      ),
      balances: BalanceResolver::new(rpc, balance_token),
      default_slippage: config.default_slippage()?,
      in_flight: DashSet::new(),
    })
  }

  #[must_use]
  pub fn quotes(&self) -> &QuoteResolver<A> {
    &self.quotes
  }

  #[must_use]
  pub fn builder(&self) -> &TransactionBuilder<A> {
    &self.builder
  }

  #[must_use]
  pub fn coordinator(&self) -> &SubmissionCoordinator<R> {
    &self.coordinator
  }

  #[must_use]
  pub fn balances(&self) -> &BalanceResolver<R> {
    &self.balances
  }

  #[must_use]
  pub fn default_slippage(&self) -> SlippageBps {
    self.default_slippage
  }

  /// Request at the configured default slippage, paying out to the
  /// requester.
  #[must_use]
  pub fn swap_request(
    &self,
    source_asset: Asset,
    destination_asset: Asset,
    source_amount: Decimal,
    requester: Pubkey,
  ) -> SwapRequest {
    SwapRequest::new(source_asset, destination_asset, source_amount, requester)
      .with_slippage(self.default_slippage)
  }

  /// Whether a swap for `requester` is currently running.
  #[must_use]
  pub fn is_in_flight(&self, requester: &Pubkey) -> bool {
    self.in_flight.contains(requester)
  }

  /// Runs the full pipeline for `request`, signing with `signer`.
  ///
  /// # Errors
  /// * Invalid request or a swap already in flight for the requester
  /// * Failure at any stage, tagged by stage in [`SwapError`]
  pub async fn request_swap<S: TransactionSigner + ?Sized>(
    &self,
    request: &SwapRequest,
    signer: &S,
  ) -> Result<SubmissionResult, SwapError> {
    request.validate()?;
    let _guard = InFlightGuard::acquire(&self.in_flight, request.requester)?;
    info!(
      requester = %request.requester,
      source = %request.source_asset,
      destination = %request.destination_asset,
      amount = %request.source_amount,
      "Swap requested"
    );
    let quote = self
      .quotes
      .get_quote(
        &request.source_asset,
        &request.destination_asset,
        request.source_amount,
        request.slippage,
      )
      .await?;
    let envelope = self
      .builder
      .build_signable_transaction(&quote, request.requester, request.recipient)
      .await?;
    self
      .coordinator
      .submit(envelope, signer, request.recipient)
      .await
  }

  /// Fresh balance snapshot for `owner`.
  pub async fn refresh_balances(&self, owner: &Pubkey) -> BalanceSnapshot {
    self.balances.resolve_balances(owner).await
  }
}

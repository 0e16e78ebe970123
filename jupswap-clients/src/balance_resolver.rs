//! Native and token balance resolution with a parsed-then-raw fallback for
//! token accounts.

use anchor_lang::prelude::Pubkey;
use anyhow::{anyhow, Result};
use itertools::Itertools;
use jupswap_core::amount::{from_base_units, lamports_to_sol};
use jupswap_core::balance::{max_balance, BalanceQueryError, BalanceSnapshot};
use jupswap_core::token_account::decode_token_amount;
use jupswap_core::tokens::Asset;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::rpc::RpcProvider;

/// Way of reading an owner's token accounts for one mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBalanceStrategy {
  /// Node-decoded accounts with exact integer amounts.
  ParsedAccounts,
  /// Base64 account data decoded locally.
  RawAccounts,
}

impl TokenBalanceStrategy {
  /// Order in which strategies are attempted.
  pub const FALLBACK_ORDER: [TokenBalanceStrategy; 2] = [
    TokenBalanceStrategy::ParsedAccounts,
    TokenBalanceStrategy::RawAccounts,
  ];

  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      TokenBalanceStrategy::ParsedAccounts => "parsed",
      TokenBalanceStrategy::RawAccounts => "raw",
    }
  }
}

impl std::fmt::Display for TokenBalanceStrategy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Resolves an owner's native balance and their balance of one token.
#[derive(Clone)]
pub struct BalanceResolver<R> {
  rpc: R,
  token: Asset,
  strategies: Vec<TokenBalanceStrategy>,
}

impl<R: RpcProvider> BalanceResolver<R> {
  /// Resolver trying [`TokenBalanceStrategy::FALLBACK_ORDER`].
  #[must_use]
  pub fn new(rpc: R, token: Asset) -> BalanceResolver<R> {
    BalanceResolver {
      rpc,
      token,
      strategies: TokenBalanceStrategy::FALLBACK_ORDER.to_vec(),
    }
  }

  /// Replaces the token strategy list; the first entry is the primary.
  #[must_use]
  pub fn with_strategies(
    mut self,
    strategies: Vec<TokenBalanceStrategy>,
  ) -> BalanceResolver<R> {
    self.strategies = strategies;
    self
  }

  #[must_use]
  pub fn strategies(&self) -> &[TokenBalanceStrategy] {
    &self.strategies
  }

  #[must_use]
  pub fn token(&self) -> &Asset {
    &self.token
  }

  /// Native balance in SOL.
  ///
  /// # Errors
  /// * RPC failure
  pub async fn native_balance(&self, owner: &Pubkey) -> Result<Decimal> {
    let lamports = self.rpc.get_balance(owner).await?;
    Ok(lamports_to_sol(lamports)?)
  }

  /// Token balance read with a single strategy. Holding several accounts
  /// yields the largest; holding none yields zero.
  ///
  /// # Errors
  /// * RPC failure
  /// * Any account undecodable
  pub async fn token_balance_with(
    &self,
    strategy: TokenBalanceStrategy,
    owner: &Pubkey,
  ) -> Result<Decimal> {
    let mint = &self.token.mint;
    let amounts: Vec<Decimal> = match strategy {
      TokenBalanceStrategy::ParsedAccounts => self
        .rpc
        .get_parsed_token_accounts(owner, mint)
        .await?
        .into_iter()
        .map(|account| account.ui_amount)
        .collect(),
      TokenBalanceStrategy::RawAccounts => self
        .rpc
        .get_raw_token_accounts(owner, mint)
        .await?
        .iter()
        .map(|account| {
          let raw = decode_token_amount(&account.data)?;
          Ok::<_, anyhow::Error>(from_base_units(raw, self.token.decimals)?)
        })
        .try_collect()?,
    };
    debug!(%owner, %strategy, accounts = amounts.len(), "Token accounts read");
    Ok(max_balance(amounts))
  }

  /// Token balance, trying each configured strategy in order until one
  /// succeeds.
  ///
  /// # Errors
  /// * Every strategy failed; the primary strategy's error is returned
  pub async fn token_balance(&self, owner: &Pubkey) -> Result<Decimal> {
    let mut primary_error = None;
    for &strategy in &self.strategies {
      match self.token_balance_with(strategy, owner).await {
        Ok(amount) => {
          if primary_error.is_some() {
            info!(%owner, %strategy, "Token balance resolved by fallback");
          }
          return Ok(amount);
        }
        Err(e) => {
          warn!(%owner, %strategy, "Token balance strategy failed: {e:#}");
          primary_error.get_or_insert(e);
        }
      }
    }
    Err(primary_error.unwrap_or_else(|| anyhow!("No token balance strategy")))
  }

  /// Resolves both balances into a fresh snapshot. A native failure fails
  /// the snapshot outright. A token failure yields `Partial` with a single
  /// strategy and `Failed` once a fallback was also exhausted.
  pub async fn resolve_balances(&self, owner: &Pubkey) -> BalanceSnapshot {
    let native = match self.native_balance(owner).await {
      Ok(native) => native,
      Err(e) => {
        return BalanceSnapshot::failed(BalanceQueryError::Native(format!(
          "{e:#}"
        )));
      }
    };
    match self.token_balance(owner).await {
      Ok(token) => BalanceSnapshot::complete(native, token),
      Err(e) => {
        let error = BalanceQueryError::Token(format!("{e:#}"));
        if self.strategies.len() > 1 {
          BalanceSnapshot::token_exhausted(native, error)
        } else {
          BalanceSnapshot::partial(native, error)
        }
      }
    }
  }
}

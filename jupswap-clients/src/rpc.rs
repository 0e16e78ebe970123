//! RPC provider abstraction (enables testing)

use std::str::FromStr;
use std::sync::Arc;

use anchor_client::solana_sdk::commitment_config::CommitmentConfig;
use anchor_client::solana_sdk::signature::Signature;
use anchor_lang::prelude::Pubkey;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::prelude::{Engine, BASE64_STANDARD};
use itertools::Itertools;
use jupswap_core::amount::from_base_units;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_account_decoder_client_types::{UiAccountData, UiAccountEncoding};
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{
  RpcAccountInfoConfig, RpcSendTransactionConfig,
};
use solana_rpc_client_api::request::{RpcRequest, TokenAccountsFilter};
use solana_rpc_client_api::response::{Response, RpcKeyedAccount};
use solana_transaction_status_client_types::UiTransactionEncoding;

/// Token account as reported by the node's parsed encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTokenAccount {
  pub address: String,
  pub ui_amount: Decimal,
}

/// Token account with undecoded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTokenAccount {
  pub address: String,
  pub data: Vec<u8>,
}

/// Where a broadcast transaction stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
  /// Unknown to the node or below the confirmation commitment.
  Pending,
  Confirmed,
  /// Landed with an execution error.
  Failed(String),
}

/// Abstraction over RPC operations needed for balances and submission
#[async_trait]
pub trait RpcProvider: Send + Sync {
  /// Native balance in lamports.
  ///
  /// # Errors
  /// Returns error if RPC call fails.
  async fn get_balance(&self, owner: &Pubkey) -> Result<u64>;

  /// # Errors
  /// Returns error if RPC call fails or any account is not parseable.
  async fn get_parsed_token_accounts(
    &self,
    owner: &Pubkey,
    mint: &Pubkey,
  ) -> Result<Vec<ParsedTokenAccount>>;

  /// # Errors
  /// Returns error if RPC call fails or any account data is undecodable.
  async fn get_raw_token_accounts(
    &self,
    owner: &Pubkey,
    mint: &Pubkey,
  ) -> Result<Vec<RawTokenAccount>>;

  /// Broadcasts serialized signed transaction bytes.
  ///
  /// # Errors
  /// Returns error if the node rejects the transaction.
  async fn send_raw_transaction(&self, transaction: &[u8]) -> Result<Signature>;

  /// # Errors
  /// Returns error if RPC call fails.
  async fn get_signature_state(
    &self,
    signature: &Signature,
  ) -> Result<SignatureState>;
}

#[async_trait]
impl<T: RpcProvider + ?Sized> RpcProvider for Arc<T> {
  async fn get_balance(&self, owner: &Pubkey) -> Result<u64> {
    (**self).get_balance(owner).await
  }

  async fn get_parsed_token_accounts(
    &self,
    owner: &Pubkey,
    mint: &Pubkey,
  ) -> Result<Vec<ParsedTokenAccount>> {
    (**self).get_parsed_token_accounts(owner, mint).await
  }

  async fn get_raw_token_accounts(
    &self,
    owner: &Pubkey,
    mint: &Pubkey,
  ) -> Result<Vec<RawTokenAccount>> {
    (**self).get_raw_token_accounts(owner, mint).await
  }

  async fn send_raw_transaction(&self, transaction: &[u8]) -> Result<Signature> {
    (**self).send_raw_transaction(transaction).await
  }

  async fn get_signature_state(
    &self,
    signature: &Signature,
  ) -> Result<SignatureState> {
    (**self).get_signature_state(signature).await
  }
}

#[derive(Deserialize)]
struct ParsedAccount {
  info: ParsedAccountInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedAccountInfo {
  token_amount: ParsedTokenAmount,
}

#[derive(Deserialize)]
struct ParsedTokenAmount {
  amount: String,
  decimals: u32,
}

/// Reads the exact token amount from a `jsonParsed` account body, using the
/// integer `amount` and `decimals` rather than the float `uiAmount`.
///
/// # Errors
/// * Missing `info.tokenAmount`
/// * Non-integer amount
pub fn parse_token_amount(parsed: &Value) -> Result<Decimal> {
  let account = ParsedAccount::deserialize(parsed)
    .context("Parsed account lacks info.tokenAmount")?;
  let amount = &account.info.token_amount;
  let raw = amount
    .amount
    .parse::<u64>()
    .with_context(|| format!("Invalid token amount {:?}", amount.amount))?;
  Ok(from_base_units(raw, amount.decimals)?)
}

/// Real RPC provider wrapping Solana's `RpcClient`
pub struct SolanaRpcProvider {
  client: Arc<RpcClient>,
  commitment: CommitmentConfig,
}

impl SolanaRpcProvider {
  /// Create a new RPC provider reading and confirming at `confirmed`
  #[must_use]
  pub fn new(client: Arc<RpcClient>) -> Self {
    Self {
      client,
      commitment: CommitmentConfig::confirmed(),
    }
  }

  #[must_use]
  pub fn from_url(url: impl Into<String>) -> Self {
    let client = RpcClient::new_with_commitment(
      url.into(),
      CommitmentConfig::confirmed(),
    );
    Self::new(Arc::new(client))
  }

  #[must_use]
  pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
    self.commitment = commitment;
    self
  }
}

#[async_trait]
impl RpcProvider for SolanaRpcProvider {
  async fn get_balance(&self, owner: &Pubkey) -> Result<u64> {
    let response = self
      .client
      .get_balance_with_commitment(owner, self.commitment)
      .await?;
    Ok(response.value)
  }

  async fn get_parsed_token_accounts(
    &self,
    owner: &Pubkey,
    mint: &Pubkey,
  ) -> Result<Vec<ParsedTokenAccount>> {
    let accounts = self
      .client
      .get_token_accounts_by_owner(owner, TokenAccountsFilter::Mint(*mint))
      .await?;
    accounts
      .into_iter()
      .map(|keyed| match keyed.account.data {
        UiAccountData::Json(parsed) => Ok(ParsedTokenAccount {
          ui_amount: parse_token_amount(&parsed.parsed)
            .with_context(|| format!("Token account {}", keyed.pubkey))?,
          address: keyed.pubkey,
        }),
        _ => Err(anyhow!("Token account {} is not parsed", keyed.pubkey)),
      })
      .try_collect()
  }

  async fn get_raw_token_accounts(
    &self,
    owner: &Pubkey,
    mint: &Pubkey,
  ) -> Result<Vec<RawTokenAccount>> {
    let config = RpcAccountInfoConfig {
      encoding: Some(UiAccountEncoding::Base64),
      commitment: Some(self.commitment),
      ..RpcAccountInfoConfig::default()
    };
    let params = json!([
      owner.to_string(),
      { "mint": mint.to_string() },
      config
    ]);
    let response: Response<Vec<RpcKeyedAccount>> = self
      .client
      .send(RpcRequest::GetTokenAccountsByOwner, params)
      .await?;
    response
      .value
      .into_iter()
      .map(|keyed| match keyed.account.data {
        UiAccountData::Binary(encoded, UiAccountEncoding::Base64) => {
          let data = BASE64_STANDARD.decode(encoded).with_context(|| {
            format!("Token account {} data is undecodable", keyed.pubkey)
          })?;
          Ok(RawTokenAccount {
            address: keyed.pubkey,
            data,
          })
        }
        _ => Err(anyhow!("Token account {} is not base64", keyed.pubkey)),
      })
      .try_collect()
  }

  async fn send_raw_transaction(&self, transaction: &[u8]) -> Result<Signature> {
    let config = RpcSendTransactionConfig {
      encoding: Some(UiTransactionEncoding::Base64),
      preflight_commitment: Some(self.commitment.commitment),
      ..RpcSendTransactionConfig::default()
    };
    let encoded = BASE64_STANDARD.encode(transaction);
    let signature: String = self
      .client
      .send(RpcRequest::SendTransaction, json!([encoded, config]))
      .await?;
    Signature::from_str(&signature)
      .with_context(|| format!("Node returned invalid signature {signature}"))
  }

  async fn get_signature_state(
    &self,
    signature: &Signature,
  ) -> Result<SignatureState> {
    let response = self.client.get_signature_statuses(&[*signature]).await?;
    let state = match response.value.into_iter().next().flatten() {
      None => SignatureState::Pending,
      Some(status) => match status.err {
        Some(err) => SignatureState::Failed(format!("{err:?}")),
        None if status.satisfies_commitment(self.commitment) => {
          SignatureState::Confirmed
        }
        None => SignatureState::Pending,
      },
    };
    Ok(state)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parsed_amount_is_exact() -> Result<()> {
    let parsed = json!({
      "info": {
        "isNative": false,
        "mint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
        "tokenAmount": {
          "amount": "1234567",
          "decimals": 6,
          "uiAmount": 1.234567,
          "uiAmountString": "1.234567"
        }
      },
      "type": "account"
    });
    assert_eq!(parse_token_amount(&parsed)?, Decimal::new(1_234_567, 6));
    Ok(())
  }

  #[test]
  fn parsed_without_token_amount() {
    let parsed = json!({ "info": { "mint": "x" }, "type": "account" });
    assert!(parse_token_amount(&parsed).is_err());
  }

  #[test]
  fn parsed_with_fractional_amount() {
    let parsed = json!({
      "info": { "tokenAmount": { "amount": "1.5", "decimals": 6 } }
    });
    assert!(parse_token_amount(&parsed).is_err());
  }
}

//! In-memory fakes for the aggregator, RPC, and signer seams.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anchor_lang::prelude::Pubkey;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::prelude::{Engine, BASE64_STANDARD};
use jupswap_clients::aggregator::{
  parse_quote_response, parse_swap_response, AggregatorApi, QuoteRequest,
  QuoteResponse, SwapTransactionRequest, SwapTransactionResponse,
};
use jupswap_clients::error::{BuildError, QuoteError, SigningError};
use jupswap_clients::prelude::{Signature, TransactionEnvelope};
use jupswap_clients::rpc::{
  ParsedTokenAccount, RawTokenAccount, RpcProvider, SignatureState,
};
use jupswap_clients::signer::TransactionSigner;
use jupswap_core::tokens::{TokenMint, USDC, WSOL};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Notify;

pub const UNSIGNED_TX: [u8; 4] = [1, 0, 0, 7];

/// Aggregator quote for 10 USDC into 0.05 SOL.
pub fn usdc_to_sol_quote() -> Value {
  json!({
    "inputMint": USDC::MINT.to_string(),
    "inAmount": "10000000",
    "outputMint": WSOL::MINT.to_string(),
    "outAmount": "50000000",
    "otherAmountThreshold": "49750000",
    "swapMode": "ExactIn",
    "slippageBps": 50,
    "priceImpactPct": "0.0003",
    "routePlan": [{
      "swapInfo": { "label": "Whirlpool", "ammKey": "amm" },
      "percent": 100
    }],
    "contextSlot": 300_000_000u64
  })
}

/// Replays canned HTTP responses through the real response parsers and
/// records every request.
pub struct FakeAggregator {
  pub quote_status: StatusCode,
  pub quote_body: Value,
  pub swap_status: StatusCode,
  pub swap_body: Value,
  pub quote_requests: Mutex<Vec<QuoteRequest>>,
  pub swap_requests: Mutex<Vec<SwapTransactionRequest>>,
}

impl FakeAggregator {
  pub fn new(quote_body: Value) -> Self {
    Self {
      quote_status: StatusCode::OK,
      quote_body,
      swap_status: StatusCode::OK,
      swap_body: json!({
        "swapTransaction": BASE64_STANDARD.encode(UNSIGNED_TX),
        "lastValidBlockHeight": 279_000_000u64
      }),
      quote_requests: Mutex::new(Vec::new()),
      swap_requests: Mutex::new(Vec::new()),
    }
  }

  pub fn quote_requests(&self) -> Vec<QuoteRequest> {
    self.quote_requests.lock().unwrap().clone()
  }

  pub fn swap_requests(&self) -> Vec<SwapTransactionRequest> {
    self.swap_requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl AggregatorApi for FakeAggregator {
  async fn quote(
    &self,
    request: &QuoteRequest,
  ) -> Result<QuoteResponse, QuoteError> {
    self.quote_requests.lock().unwrap().push(request.clone());
    parse_quote_response(
      self.quote_status,
      self.quote_body.to_string().as_bytes(),
    )
  }

  async fn swap_transaction(
    &self,
    request: &SwapTransactionRequest,
  ) -> Result<SwapTransactionResponse, BuildError> {
    self.swap_requests.lock().unwrap().push(request.clone());
    parse_swap_response(self.swap_status, self.swap_body.to_string().as_bytes())
  }
}

/// RPC node with fixed balances and a scripted signature status sequence.
/// `None` in any slot makes the corresponding call fail.
pub struct FakeRpc {
  pub lamports: Option<u64>,
  pub parsed_accounts: Option<Vec<Decimal>>,
  pub raw_accounts: Option<Vec<Vec<u8>>>,
  pub send_result: Option<Signature>,
  /// Consumed front to back; `Pending` once exhausted.
  pub statuses: Mutex<VecDeque<Option<SignatureState>>>,
  pub sent: Mutex<Vec<Vec<u8>>>,
  pub status_queries: AtomicUsize,
}

impl Default for FakeRpc {
  fn default() -> Self {
    Self {
      lamports: Some(1_500_000_000),
      parsed_accounts: Some(Vec::new()),
      raw_accounts: Some(Vec::new()),
      send_result: Some(Signature::new_unique()),
      statuses: Mutex::new(VecDeque::new()),
      sent: Mutex::new(Vec::new()),
      status_queries: AtomicUsize::new(0),
    }
  }
}

impl FakeRpc {
  pub fn with_statuses(
    statuses: impl IntoIterator<Item = Option<SignatureState>>,
  ) -> Self {
    Self {
      statuses: Mutex::new(statuses.into_iter().collect()),
      ..Self::default()
    }
  }

  pub fn sent(&self) -> Vec<Vec<u8>> {
    self.sent.lock().unwrap().clone()
  }
}

#[async_trait]
impl RpcProvider for FakeRpc {
  async fn get_balance(&self, _owner: &Pubkey) -> Result<u64> {
    self.lamports.ok_or_else(|| anyhow!("getBalance timed out"))
  }

  async fn get_parsed_token_accounts(
    &self,
    _owner: &Pubkey,
    _mint: &Pubkey,
  ) -> Result<Vec<ParsedTokenAccount>> {
    let amounts = self
      .parsed_accounts
      .clone()
      .ok_or_else(|| anyhow!("jsonParsed encoding unavailable"))?;
    Ok(
      amounts
        .into_iter()
        .enumerate()
        .map(|(i, ui_amount)| ParsedTokenAccount {
          address: format!("parsed-{i}"),
          ui_amount,
        })
        .collect(),
    )
  }

  async fn get_raw_token_accounts(
    &self,
    _owner: &Pubkey,
    _mint: &Pubkey,
  ) -> Result<Vec<RawTokenAccount>> {
    let accounts = self
      .raw_accounts
      .clone()
      .ok_or_else(|| anyhow!("getTokenAccountsByOwner failed"))?;
    Ok(
      accounts
        .into_iter()
        .enumerate()
        .map(|(i, data)| RawTokenAccount {
          address: format!("raw-{i}"),
          data,
        })
        .collect(),
    )
  }

  async fn send_raw_transaction(&self, transaction: &[u8]) -> Result<Signature> {
    self.sent.lock().unwrap().push(transaction.to_vec());
    self
      .send_result
      .ok_or_else(|| anyhow!("Blockhash not found"))
  }

  async fn get_signature_state(
    &self,
    _signature: &Signature,
  ) -> Result<SignatureState> {
    self.status_queries.fetch_add(1, Ordering::SeqCst);
    match self.statuses.lock().unwrap().pop_front() {
      Some(Some(state)) => Ok(state),
      Some(None) => Err(anyhow!("getSignatureStatuses failed")),
      None => Ok(SignatureState::Pending),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerBehavior {
  Approve,
  Reject,
  ReturnEmpty,
}

/// Wallet stand-in. Approving appends a marker byte to the payload.
pub struct FakeSigner {
  pub behavior: SignerBehavior,
  pub calls: AtomicUsize,
  /// When set, signals `entered` then waits on `release` before answering.
  pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeSigner {
  pub fn new(behavior: SignerBehavior) -> Self {
    Self {
      behavior,
      calls: AtomicUsize::new(0),
      gate: None,
    }
  }

  pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
    Self {
      gate: Some((entered, release)),
      ..Self::new(SignerBehavior::Approve)
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl TransactionSigner for FakeSigner {
  async fn sign(
    &self,
    envelope: &TransactionEnvelope,
  ) -> Result<Vec<u8>, SigningError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some((entered, release)) = &self.gate {
      entered.notify_one();
      release.notified().await;
    }
    match self.behavior {
      SignerBehavior::Approve => {
        let mut signed = envelope.payload().to_vec();
        signed.push(0xff);
        Ok(signed)
      }
      SignerBehavior::Reject => {
        Err(SigningError::Rejected("User rejected the request".into()))
      }
      SignerBehavior::ReturnEmpty => Ok(Vec::new()),
    }
  }
}

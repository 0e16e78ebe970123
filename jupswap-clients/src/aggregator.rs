//! Aggregator HTTP API: request/response schemas, the [`AggregatorApi`] seam,
//! and its Jupiter implementation.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use jupswap_core::slippage_config::SlippageBps;
use reqwest::{Client, Proxy, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SwapConfig;
use crate::error::{BuildError, QuoteError};

/// Query parameters of `GET /quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
  pub input_mint: String,
  pub output_mint: String,
  /// Base units as a decimal integer string.
  pub amount: String,
  pub slippage_bps: u16,
}

impl QuoteRequest {
  #[must_use]
  pub fn new(
    input_mint: Pubkey,
    output_mint: Pubkey,
    amount: u64,
    slippage: SlippageBps,
  ) -> QuoteRequest {
    QuoteRequest {
      input_mint: input_mint.to_string(),
      output_mint: output_mint.to_string(),
      amount: amount.to_string(),
      slippage_bps: slippage.bps(),
    }
  }
}

/// Fields of a quote response the pipeline depends on. Anything else in the
/// response is carried along untouched in [`QuoteResponse::raw`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
  pub input_mint: String,
  pub in_amount: String,
  pub output_mint: String,
  pub out_amount: String,
  #[serde(default)]
  pub other_amount_threshold: Option<String>,
  pub slippage_bps: u16,
  #[serde(default)]
  pub price_impact_pct: Option<String>,
  pub route_plan: Vec<Value>,
}

/// Validated quote response.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteResponse {
  pub summary: QuoteSummary,
  /// Exact JSON returned by the aggregator, echoed back when building.
  pub raw: Value,
}

/// Body of `POST /swap`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransactionRequest {
  pub quote_response: Value,
  pub user_public_key: String,
  pub wrap_and_unwrap_sol: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub destination_wallet: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub platform_fee_bps: Option<u16>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fee_account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransactionResponse {
  /// Base64 encoded unsigned transaction.
  pub swap_transaction: String,
  #[serde(default)]
  pub last_valid_block_height: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: Option<String>,
}

/// Extracts the `error` field of a failed response.
fn error_message(body: &[u8]) -> String {
  serde_json::from_slice::<ErrorBody>(body)
    .ok()
    .and_then(|body| body.error)
    .unwrap_or_else(|| "Unknown error".to_string())
}

/// Validates a `GET /quote` response.
///
/// # Errors
/// * Non-success status
/// * Body missing required fields
/// * Empty route plan
pub fn parse_quote_response(
  status: StatusCode,
  body: &[u8],
) -> Result<QuoteResponse, QuoteError> {
  if !status.is_success() {
    return Err(QuoteError::Rejected {
      status: status.as_u16(),
      message: error_message(body),
    });
  }
  let raw: Value = serde_json::from_slice(body)
    .map_err(|e| QuoteError::Malformed(e.to_string()))?;
  let summary = QuoteSummary::deserialize(&raw)
    .map_err(|e| QuoteError::Malformed(e.to_string()))?;
  if summary.route_plan.is_empty() {
    return Err(QuoteError::NoRoute);
  }
  Ok(QuoteResponse { summary, raw })
}

/// Validates a `POST /swap` response.
///
/// # Errors
/// * Non-success status
/// * Body missing `swapTransaction`
pub fn parse_swap_response(
  status: StatusCode,
  body: &[u8],
) -> Result<SwapTransactionResponse, BuildError> {
  if !status.is_success() {
    return Err(BuildError::Rejected {
      status: status.as_u16(),
      message: error_message(body),
    });
  }
  serde_json::from_slice(body).map_err(|e| BuildError::Malformed(e.to_string()))
}

/// Abstraction over the aggregator's quote and swap endpoints.
#[async_trait]
pub trait AggregatorApi: Send + Sync {
  /// # Errors
  /// Returns error if the request fails or the response is unusable.
  async fn quote(
    &self,
    request: &QuoteRequest,
  ) -> Result<QuoteResponse, QuoteError>;

  /// # Errors
  /// Returns error if the request fails or the response is unusable.
  async fn swap_transaction(
    &self,
    request: &SwapTransactionRequest,
  ) -> Result<SwapTransactionResponse, BuildError>;
}

#[async_trait]
impl<T: AggregatorApi + ?Sized> AggregatorApi for Arc<T> {
  async fn quote(
    &self,
    request: &QuoteRequest,
  ) -> Result<QuoteResponse, QuoteError> {
    (**self).quote(request).await
  }

  async fn swap_transaction(
    &self,
    request: &SwapTransactionRequest,
  ) -> Result<SwapTransactionResponse, BuildError> {
    (**self).swap_transaction(request).await
  }
}

/// Jupiter v6 HTTP client.
#[derive(Clone)]
pub struct JupiterClient {
  http: Client,
  base_url: String,
}

impl JupiterClient {
  /// Creates a client for the given base URL, honouring `HTTPS_PROXY` or
  /// `HTTP_PROXY` from the environment.
  ///
  /// # Errors
  /// * Invalid proxy URL
  /// * HTTP client construction
  pub fn new(
    base_url: impl Into<String>,
    timeout: Duration,
  ) -> anyhow::Result<JupiterClient> {
    let mut builder = Client::builder()
      .pool_idle_timeout(Duration::from_secs(60))
      .timeout(timeout)
      .connect_timeout(Duration::from_secs(5));
    if let Ok(proxy) =
      env::var("HTTPS_PROXY").or_else(|_| env::var("https_proxy"))
    {
      builder = builder.proxy(Proxy::https(&proxy)?);
    } else if let Ok(proxy) =
      env::var("HTTP_PROXY").or_else(|_| env::var("http_proxy"))
    {
      builder = builder.proxy(Proxy::http(&proxy)?);
    }
    Ok(JupiterClient {
      http: builder.build()?,
      base_url: base_url.into(),
    })
  }

  /// # Errors
  /// * HTTP client construction
  pub fn from_config(config: &SwapConfig) -> anyhow::Result<JupiterClient> {
    JupiterClient::new(config.aggregator_url.clone(), config.http_timeout())
  }

  fn endpoint(&self, path: &str) -> String {
    format!(
      "{}/{}",
      self.base_url.trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }
}

#[async_trait]
impl AggregatorApi for JupiterClient {
  async fn quote(
    &self,
    request: &QuoteRequest,
  ) -> Result<QuoteResponse, QuoteError> {
    let response = self
      .http
      .get(self.endpoint("/quote"))
      .query(request)
      .send()
      .await
      .map_err(|e| QuoteError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
      .bytes()
      .await
      .map_err(|e| QuoteError::Transport(e.to_string()))?;
    parse_quote_response(status, &body)
  }

  async fn swap_transaction(
    &self,
    request: &SwapTransactionRequest,
  ) -> Result<SwapTransactionResponse, BuildError> {
    let response = self
      .http
      .post(self.endpoint("/swap"))
      .json(request)
      .send()
      .await
      .map_err(|e| BuildError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
      .bytes()
      .await
      .map_err(|e| BuildError::Transport(e.to_string()))?;
    parse_swap_response(status, &body)
  }
}

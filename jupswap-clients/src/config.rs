//! Runtime configuration for the swap clients.

use std::str::FromStr;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use anyhow::{Context, Result};
use jupswap_core::fee_config::PlatformFee;
use jupswap_core::slippage_config::{SlippageBps, DEFAULT_SLIPPAGE_BPS};
use serde::{Deserialize, Deserializer};

pub const DEFAULT_AGGREGATOR_URL: &str = "https://quote-api.jup.ag/v6";
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Settings shared by the aggregator client, RPC provider, and submission
/// coordinator. Deserializable from JSON; missing fields take defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
  pub aggregator_url: String,
  pub rpc_url: String,
  pub http_timeout_millis: u64,
  /// Matches the aggregator's typical blockhash validity window.
  pub confirmation_timeout_secs: u64,
  pub confirmation_poll_millis: u64,
  pub default_slippage_bps: u16,
  pub platform_fee: PlatformFeeConfig,
}

impl Default for SwapConfig {
  fn default() -> Self {
    SwapConfig {
      aggregator_url: DEFAULT_AGGREGATOR_URL.to_string(),
      rpc_url: DEFAULT_RPC_URL.to_string(),
      http_timeout_millis: 10_000,
      confirmation_timeout_secs: 60,
      confirmation_poll_millis: 500,
      default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
      platform_fee: PlatformFeeConfig::default(),
    }
  }
}

impl SwapConfig {
  /// Parses configuration from a JSON document.
  ///
  /// # Errors
  /// * Invalid JSON or field types
  pub fn from_json(json: &str) -> Result<SwapConfig> {
    serde_json::from_str(json).context("Invalid swap configuration")
  }

  /// Defaults overridden by `AGGREGATOR_URL`, `RPC_URL`, and
  /// `CONFIRMATION_TIMEOUT_SECS` when set.
  ///
  /// # Errors
  /// * `CONFIRMATION_TIMEOUT_SECS` is not an integer
  pub fn from_env() -> Result<SwapConfig> {
    let mut config = SwapConfig::default();
    if let Ok(url) = std::env::var("AGGREGATOR_URL") {
      config.aggregator_url = url;
    }
    if let Ok(url) = std::env::var("RPC_URL") {
      config.rpc_url = url;
    }
    if let Ok(secs) = std::env::var("CONFIRMATION_TIMEOUT_SECS") {
      config.confirmation_timeout_secs = secs
        .parse()
        .context("CONFIRMATION_TIMEOUT_SECS must be an integer")?;
    }
    Ok(config)
  }

  #[must_use]
  pub fn http_timeout(&self) -> Duration {
    Duration::from_millis(self.http_timeout_millis)
  }

  #[must_use]
  pub fn confirmation_timeout(&self) -> Duration {
    Duration::from_secs(self.confirmation_timeout_secs)
  }

  #[must_use]
  pub fn confirmation_poll_interval(&self) -> Duration {
    Duration::from_millis(self.confirmation_poll_millis)
  }

  /// # Errors
  /// * Configured default is outside the accepted slippage range
  pub fn default_slippage(&self) -> Result<SlippageBps> {
    Ok(SlippageBps::new(self.default_slippage_bps)?)
  }

  /// # Errors
  /// * Fee rate of 100% or more
  pub fn platform_fee(&self) -> Result<PlatformFee> {
    Ok(PlatformFee::new(
      self.platform_fee.fee_bps,
      self.platform_fee.fee_account,
    )?)
  }
}

/// Serialized form of [`PlatformFee`], with the fee account as base58.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PlatformFeeConfig {
  pub fee_bps: u16,
  #[serde(deserialize_with = "optional_pubkey")]
  pub fee_account: Option<Pubkey>,
}

fn optional_pubkey<'de, D>(deserializer: D) -> Result<Option<Pubkey>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<String>::deserialize(deserializer)?
    .map(|key| Pubkey::from_str(&key).map_err(serde::de::Error::custom))
    .transpose()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() -> Result<()> {
    let config = SwapConfig::default();
    assert_eq!(config.confirmation_timeout(), Duration::from_secs(60));
    assert_eq!(config.default_slippage()?.bps(), 50);
    assert_eq!(config.platform_fee()?, PlatformFee::NONE);
    Ok(())
  }

  #[test]
  fn partial_json_keeps_defaults() -> Result<()> {
    let fee_account = Pubkey::new_unique();
    let json = format!(
      r#"{{
        "rpc_url": "http://127.0.0.1:8899",
        "platform_fee": {{ "fee_bps": 20, "fee_account": "{fee_account}" }}
      }}"#
    );
    let config = SwapConfig::from_json(&json)?;
    assert_eq!(config.rpc_url, "http://127.0.0.1:8899");
    assert_eq!(config.aggregator_url, DEFAULT_AGGREGATOR_URL);
    assert_eq!(config.platform_fee()?.active(), Some((20, fee_account)));
    Ok(())
  }

  #[test]
  fn bad_fee_account_rejected() {
    let json = r#"{ "platform_fee": { "fee_account": "not-a-key" } }"#;
    assert!(SwapConfig::from_json(json).is_err());
  }

  #[test]
  fn out_of_range_slippage_rejected() -> Result<()> {
    let config = SwapConfig::from_json(r#"{ "default_slippage_bps": 900 }"#)?;
    assert!(config.default_slippage().is_err());
    Ok(())
  }
}

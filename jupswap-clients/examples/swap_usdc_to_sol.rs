//! Swaps USDC into SOL with a local keypair.
//!
//! ```text
//! KEYPAIR_PATH=~/.config/solana/id.json \
//!   cargo run -p jupswap-clients --example swap_usdc_to_sol -- 10.0
//! ```

use std::str::FromStr;
use std::sync::Arc;

use anchor_client::solana_sdk::signature::read_keypair_file;
use anyhow::{anyhow, Context};
use jupswap_clients::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(env_filter).init();

  let amount = std::env::args()
    .nth(1)
    .map(|arg| Decimal::from_str(&arg))
    .transpose()
    .context("Amount must be a decimal number")?
    .unwrap_or(Decimal::ONE);
  let keypair_path =
    std::env::var("KEYPAIR_PATH").context("KEYPAIR_PATH is not set")?;
  let keypair = read_keypair_file(&keypair_path)
    .map_err(|e| anyhow!("Failed to read {keypair_path}: {e}"))?;
  let signer = KeypairSigner::new(Arc::new(keypair));

  let config = SwapConfig::from_env()?;
  let client = SwapClient::from_config(&config)?;
  let request = client.swap_request(
    USDC::asset(),
    WSOL::asset(),
    amount,
    signer.pubkey(),
  );

  let before = client.refresh_balances(&signer.pubkey()).await;
  info!(sol = ?before.native_amount, usdc = ?before.token_amount, "Before");

  match client.request_swap(&request, &signer).await {
    Ok(result) => info!(signature = %result.signature, "Swap confirmed"),
    Err(err) if err.is_outcome_unknown() => {
      warn!("{err}; check the explorer before retrying");
    }
    Err(err) => return Err(err.into()),
  }

  let after = client.refresh_balances(&signer.pubkey()).await;
  info!(sol = ?after.native_amount, usdc = ?after.token_amount, "After");
  Ok(())
}

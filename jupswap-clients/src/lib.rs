//! # Jupswap Clients
//!
//! Swap pipeline against the Jupiter aggregator: quote, build, sign, submit,
//! and confirm, plus wallet balance resolution over Solana RPC.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use jupswap_clients::prelude::*;
//!
//! # async fn example(keypair: Keypair) -> Result<()> {
//! let config = SwapConfig::from_env()?;
//! let client = SwapClient::from_config(&config)?;
//! let signer = KeypairSigner::new(Arc::new(keypair));
//!
//! // Swap 10 USDC into SOL at 0.5% slippage
//! let request = SwapRequest::usdc_to_sol(Decimal::TEN, signer.pubkey())
//!   .with_slippage(SlippageBps::new(50)?);
//! let result = client.request_swap(&request, &signer).await?;
//! println!("confirmed {}", result.signature);
//!
//! let snapshot = client.refresh_balances(&signer.pubkey()).await;
//! println!("SOL {:?}, USDC {:?}", snapshot.native_amount, snapshot.token_amount);
//! # Ok(())
//! # }
//! ```
//!
//! ## Stages
//!
//! - [`QuoteResolver`](quote_resolver::QuoteResolver) - Priced routes
//! - [`TransactionBuilder`](transaction_builder::TransactionBuilder) -
//!   Unsigned transaction envelopes
//! - [`SubmissionCoordinator`](submission::SubmissionCoordinator) - Sign,
//!   broadcast, confirm
//! - [`BalanceResolver`](balance_resolver::BalanceResolver) - Native and
//!   token balances

pub mod aggregator;
pub mod balance_resolver;
pub mod config;
pub mod error;
pub mod prelude;
pub mod quote_resolver;
pub mod rpc;
pub mod signer;
pub mod submission;
pub mod swap_client;
pub mod transaction_builder;

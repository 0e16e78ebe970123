pub use anchor_client::solana_sdk::commitment_config::CommitmentConfig;
pub use anchor_client::solana_sdk::signature::{Keypair, Signature, Signer};
pub use anchor_lang::prelude::Pubkey;
pub use anyhow::Result;
pub use jupswap_core::balance::{BalanceSnapshot, BalanceStatus};
pub use jupswap_core::envelope::{TransactionEnvelope, TransactionKind};
pub use jupswap_core::fee_config::PlatformFee;
pub use jupswap_core::slippage_config::SlippageBps;
pub use jupswap_core::tokens::{Asset, TokenMint, USDC, WSOL};
pub use rust_decimal::Decimal;

pub use crate::aggregator::{AggregatorApi, JupiterClient};
pub use crate::balance_resolver::{BalanceResolver, TokenBalanceStrategy};
pub use crate::config::SwapConfig;
pub use crate::error::{
  BroadcastError, BuildError, QuoteError, SigningError, SwapError,
};
pub use crate::quote_resolver::{Quote, QuoteResolver};
pub use crate::rpc::{RpcProvider, SignatureState, SolanaRpcProvider};
pub use crate::signer::{KeypairSigner, TransactionSigner};
pub use crate::submission::{
  SubmissionCoordinator, SubmissionResult, SubmissionState,
};
pub use crate::swap_client::{SwapClient, SwapRequest};
pub use crate::transaction_builder::TransactionBuilder;

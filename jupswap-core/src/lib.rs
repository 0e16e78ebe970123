#![allow(clippy::missing_errors_doc)]

pub mod amount;
pub mod balance;
pub mod envelope;
pub mod error;
pub mod fee_config;
pub mod slippage_config;
pub mod token_account;
pub mod tokens;

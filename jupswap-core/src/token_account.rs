//! Raw SPL token account decoding, used when parsed account data is not
//! available from the node.

use anchor_spl::token::spl_token::solana_program::program_pack::Pack;
use anchor_spl::token::spl_token::state::Account as SplTokenAccount;

use crate::error::CoreError::{self, TokenAccountLength, TokenAccountUnpack};

/// Byte length of the base SPL token account layout.
pub const TOKEN_ACCOUNT_LEN: usize = SplTokenAccount::LEN;

/// Extracts the raw `amount` field from token account data.
/// Token-2022 extension bytes past the base layout are ignored.
///
/// # Errors
/// * Data shorter than the base layout
/// * Base layout fails to unpack (e.g. invalid account state)
pub fn decode_token_amount(data: &[u8]) -> Result<u64, CoreError> {
  let base = data
    .get(..TOKEN_ACCOUNT_LEN)
    .ok_or(TokenAccountLength(data.len()))?;
  let account = SplTokenAccount::unpack_from_slice(base)
    .map_err(|e| TokenAccountUnpack(e.to_string()))?;
  Ok(account.amount)
}

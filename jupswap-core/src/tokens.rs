use anchor_lang::prelude::{pubkey, Pubkey};

use crate::error::CoreError;

/// Decimal exponent of native SOL, i.e. lamports per SOL is `10^9`.
pub const NATIVE_DECIMALS: u32 = 9;

/// Compile-time marker for a token with a fixed mint and decimal exponent.
pub trait TokenMint {
  const MINT: Pubkey;
  const DECIMALS: u32;
  const SYMBOL: &'static str;

  /// Runtime description of the token.
  #[must_use]
  fn asset() -> Asset {
    Asset::new(Self::MINT, Self::DECIMALS, Self::SYMBOL)
  }
}

macro_rules! known_token {
  ($token:ident, $mint:literal, $decimals:literal) => {
    pub struct $token;

    impl TokenMint for $token {
      const MINT: Pubkey = pubkey!($mint);
      const DECIMALS: u32 = $decimals;
      const SYMBOL: &'static str = stringify!($token);
    }
  };
}

known_token!(USDC, "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6);
known_token!(WSOL, "So11111111111111111111111111111111111111112", 9);

/// A fungible asset as seen by the swap pipeline: its mint and the exponent
/// needed to move between human amounts and base units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
  pub mint: Pubkey,
  pub decimals: u32,
  pub symbol: String,
}

impl Asset {
  #[must_use]
  pub fn new(mint: Pubkey, decimals: u32, symbol: impl Into<String>) -> Asset {
    Asset {
      mint,
      decimals,
      symbol: symbol.into(),
    }
  }

  /// Looks up one of the known tokens by mint.
  pub fn from_mint(mint: Pubkey) -> Result<Asset, CoreError> {
    match mint {
      USDC::MINT => Ok(USDC::asset()),
      WSOL::MINT => Ok(WSOL::asset()),
      _ => Err(CoreError::UnknownToken(mint)),
    }
  }
}

impl TryFrom<Pubkey> for Asset {
  type Error = CoreError;

  fn try_from(mint: Pubkey) -> Result<Asset, CoreError> {
    Asset::from_mint(mint)
  }
}

impl std::fmt::Display for Asset {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} ({})", self.symbol, self.mint)
  }
}

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use jupswap_core::amount::{from_base_units, to_base_units};
use jupswap_core::slippage_config::SlippageBps;
use jupswap_core::tokens::Asset;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::aggregator::{AggregatorApi, QuoteRequest, QuoteResponse};
use crate::error::QuoteError;

/// Priced route for an exact-in swap, valid until the aggregator's
/// blockhash window closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
  source: Asset,
  destination: Asset,
  input_amount: u64,
  output_amount: u64,
  min_output_amount: Option<u64>,
  price_impact_pct: Option<Decimal>,
  slippage: SlippageBps,
  route: Value,
}

impl Quote {
  /// Validates an aggregator response against the requested pair.
  ///
  /// # Errors
  /// * Response mints differ from the requested pair
  /// * Amount fields are not base-unit integers
  pub fn from_response(
    source: Asset,
    destination: Asset,
    slippage: SlippageBps,
    response: QuoteResponse,
  ) -> Result<Quote, QuoteError> {
    let summary = &response.summary;
    check_mint(source.mint, &summary.input_mint)?;
    check_mint(destination.mint, &summary.output_mint)?;
    let input_amount = parse_units("inAmount", &summary.in_amount)?;
    let output_amount = parse_units("outAmount", &summary.out_amount)?;
    let min_output_amount = summary
      .other_amount_threshold
      .as_deref()
      .map(|threshold| parse_units("otherAmountThreshold", threshold))
      .transpose()?;
    let price_impact_pct = summary
      .price_impact_pct
      .as_deref()
      .map(|pct| {
        Decimal::from_str(pct).map_err(|e| {
          QuoteError::Malformed(format!("priceImpactPct {pct:?}: {e}"))
        })
      })
      .transpose()?;
    if summary.slippage_bps != slippage.bps() {
      warn!(
        requested = slippage.bps(),
        quoted = summary.slippage_bps,
        "Aggregator adjusted slippage"
      );
    }
    Ok(Quote {
      source,
      destination,
      input_amount,
      output_amount,
      min_output_amount,
      price_impact_pct,
      slippage,
      route: response.raw,
    })
  }

  #[must_use]
  pub fn source(&self) -> &Asset {
    &self.source
  }

  #[must_use]
  pub fn destination(&self) -> &Asset {
    &self.destination
  }

  /// Input in source base units.
  #[must_use]
  pub fn input_amount(&self) -> u64 {
    self.input_amount
  }

  /// Expected output in destination base units.
  #[must_use]
  pub fn output_amount(&self) -> u64 {
    self.output_amount
  }

  /// Worst acceptable output after slippage. Falls back to applying the
  /// requested tolerance when the aggregator omits its threshold.
  #[must_use]
  pub fn min_output_amount(&self) -> u64 {
    self
      .min_output_amount
      .unwrap_or_else(|| self.slippage.min_amount_out(self.output_amount))
  }

  /// Expected output in human units.
  ///
  /// # Errors
  /// * Destination exponent beyond `Decimal`'s scale
  pub fn output_ui_amount(&self) -> Result<Decimal, QuoteError> {
    Ok(from_base_units(self.output_amount, self.destination.decimals)?)
  }

  #[must_use]
  pub fn price_impact_pct(&self) -> Option<Decimal> {
    self.price_impact_pct
  }

  #[must_use]
  pub fn slippage(&self) -> SlippageBps {
    self.slippage
  }

  /// Route description exactly as the aggregator returned it.
  #[must_use]
  pub fn route(&self) -> &Value {
    &self.route
  }
}

fn check_mint(expected: Pubkey, actual: &str) -> Result<(), QuoteError> {
  let actual = Pubkey::from_str(actual)
    .map_err(|e| QuoteError::Malformed(format!("mint {actual:?}: {e}")))?;
  if actual == expected {
    Ok(())
  } else {
    Err(QuoteError::MintMismatch { expected, actual })
  }
}

fn parse_units(field: &str, value: &str) -> Result<u64, QuoteError> {
  value
    .parse()
    .map_err(|e| QuoteError::Malformed(format!("{field} {value:?}: {e}")))
}

/// Obtains priced routes from the aggregator. Never retries; every call is
/// one request.
#[derive(Clone)]
pub struct QuoteResolver<A> {
  aggregator: A,
}

impl<A: AggregatorApi> QuoteResolver<A> {
  #[must_use]
  pub fn new(aggregator: A) -> QuoteResolver<A> {
    QuoteResolver { aggregator }
  }

  /// Quotes swapping `amount` of `source` (human units) into `destination`.
  ///
  /// # Errors
  /// * Amount not positive or below the source asset's precision
  /// * Aggregator rejection, transport failure, or unusable response
  pub async fn get_quote(
    &self,
    source: &Asset,
    destination: &Asset,
    amount: Decimal,
    slippage: SlippageBps,
  ) -> Result<Quote, QuoteError> {
    let base_units = to_base_units(amount, source.decimals)?;
    let request =
      QuoteRequest::new(source.mint, destination.mint, base_units, slippage);
    debug!(
      %source, %destination, %amount, base_units, %slippage,
      "Requesting quote"
    );
    let response = self.aggregator.quote(&request).await?;
    let quote = Quote::from_response(
      source.clone(),
      destination.clone(),
      slippage,
      response,
    )?;
    info!(
      %source,
      %destination,
      in_amount = quote.input_amount(),
      out_amount = quote.output_amount(),
      min_out = quote.min_output_amount(),
      "Quote received"
    );
    Ok(quote)
  }
}

#[cfg(test)]
mod tests {
  use jupswap_core::tokens::{TokenMint, USDC, WSOL};
  use serde_json::json;

  use super::*;
  use crate::aggregator::QuoteSummary;

  fn response(
    input: Pubkey,
    output: Pubkey,
    threshold: Option<&str>,
  ) -> QuoteResponse {
    let raw = json!({ "inputMint": input.to_string(), "routePlan": [{}] });
    QuoteResponse {
      summary: QuoteSummary {
        input_mint: input.to_string(),
        in_amount: "10000000".into(),
        output_mint: output.to_string(),
        out_amount: "50000000".into(),
        other_amount_threshold: threshold.map(Into::into),
        slippage_bps: 50,
        price_impact_pct: Some("0.12".into()),
        route_plan: vec![json!({})],
      },
      raw,
    }
  }

  #[test]
  fn quote_from_response() -> anyhow::Result<()> {
    let quote = Quote::from_response(
      USDC::asset(),
      WSOL::asset(),
      SlippageBps::default(),
      response(USDC::MINT, WSOL::MINT, Some("49750000")),
    )?;
    assert_eq!(quote.input_amount(), 10_000_000);
    assert_eq!(quote.output_amount(), 50_000_000);
    assert_eq!(quote.min_output_amount(), 49_750_000);
    assert_eq!(quote.output_ui_amount()?, Decimal::new(5, 2));
    assert_eq!(quote.price_impact_pct(), Some(Decimal::new(12, 2)));
    assert_eq!(quote.route()["inputMint"], USDC::MINT.to_string());
    Ok(())
  }

  #[test]
  fn threshold_falls_back_to_slippage() -> anyhow::Result<()> {
    let quote = Quote::from_response(
      USDC::asset(),
      WSOL::asset(),
      SlippageBps::new(100)?,
      response(USDC::MINT, WSOL::MINT, None),
    )?;
    assert_eq!(quote.min_output_amount(), 49_500_000);
    Ok(())
  }

  #[test]
  fn mismatched_output_mint() {
    let other = Pubkey::new_unique();
    let result = Quote::from_response(
      USDC::asset(),
      WSOL::asset(),
      SlippageBps::default(),
      response(USDC::MINT, other, None),
    );
    assert!(matches!(
      result,
      Err(QuoteError::MintMismatch { actual, .. }) if actual == other
    ));
  }

  #[test]
  fn non_integer_amount_is_malformed() {
    let mut response = response(USDC::MINT, WSOL::MINT, None);
    response.summary.out_amount = "5.0".into();
    let result = Quote::from_response(
      USDC::asset(),
      WSOL::asset(),
      SlippageBps::default(),
      response,
    );
    assert!(matches!(result, Err(QuoteError::Malformed(_))));
  }
}

//! Decoded, not-yet-signed transaction payloads returned by the aggregator.

use base64::prelude::{Engine, BASE64_STANDARD};

use crate::error::CoreError::{self, EmptyEnvelope, EnvelopeEncoding};

/// Wire format of a transaction payload.
///
/// The aggregator marks legacy payloads with a leading zero byte; any other
/// leading byte is a versioned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
  Legacy,
  Versioned,
}

impl TransactionKind {
  /// Reads the discriminant from the first byte; `None` for an empty payload.
  #[must_use]
  pub fn classify(payload: &[u8]) -> Option<TransactionKind> {
    payload.first().map(|byte| match byte {
      0 => TransactionKind::Legacy,
      _ => TransactionKind::Versioned,
    })
  }

  #[must_use]
  pub const fn as_str(&self) -> &'static str {
    match self {
      TransactionKind::Legacy => "legacy",
      TransactionKind::Versioned => "versioned",
    }
  }
}

impl std::fmt::Display for TransactionKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Signable transaction bytes tagged with their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEnvelope {
  kind: TransactionKind,
  payload: Vec<u8>,
}

impl TransactionEnvelope {
  /// Classifies raw payload bytes.
  pub fn from_bytes(payload: Vec<u8>) -> Result<TransactionEnvelope, CoreError> {
    let kind = TransactionKind::classify(&payload).ok_or(EmptyEnvelope)?;
    Ok(TransactionEnvelope { kind, payload })
  }

  /// Decodes a base64 payload and classifies it.
  ///
  /// # Errors
  /// * Payload is not valid base64
  /// * Payload decodes to zero bytes
  pub fn decode_base64(encoded: &str) -> Result<TransactionEnvelope, CoreError> {
    let payload = BASE64_STANDARD
      .decode(encoded.trim())
      .map_err(|e| EnvelopeEncoding(e.to_string()))?;
    TransactionEnvelope::from_bytes(payload)
  }

  #[must_use]
  pub fn kind(&self) -> TransactionKind {
    self.kind
  }

  #[must_use]
  pub fn payload(&self) -> &[u8] {
    &self.payload
  }

  #[must_use]
  pub fn into_payload(self) -> Vec<u8> {
    self.payload
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  #[test]
  fn zero_byte_is_legacy() -> Result<(), CoreError> {
    let envelope = TransactionEnvelope::from_bytes(vec![0, 1, 2])?;
    assert_eq!(envelope.kind(), TransactionKind::Legacy);
    assert_eq!(envelope.payload(), &[0, 1, 2]);
    Ok(())
  }

  #[test]
  fn versioned_prefix() -> Result<(), CoreError> {
    let envelope = TransactionEnvelope::from_bytes(vec![0x80, 0])?;
    assert_eq!(envelope.kind(), TransactionKind::Versioned);
    Ok(())
  }

  #[test]
  fn decodes_base64() -> Result<(), CoreError> {
    let encoded = BASE64_STANDARD.encode([1u8, 2, 3]);
    let envelope = TransactionEnvelope::decode_base64(&encoded)?;
    assert_eq!(envelope.kind(), TransactionKind::Versioned);
    assert_eq!(envelope.into_payload(), vec![1, 2, 3]);
    Ok(())
  }

  #[test]
  fn empty_payload_rejected() {
    assert_eq!(TransactionEnvelope::decode_base64(""), Err(EmptyEnvelope));
    assert_eq!(TransactionEnvelope::from_bytes(vec![]), Err(EmptyEnvelope));
  }

  #[test]
  fn malformed_base64_rejected() {
    let result = TransactionEnvelope::decode_base64("not base64!");
    assert!(matches!(result, Err(EnvelopeEncoding(_))));
  }

  proptest! {
    #[test]
    fn classification_follows_first_byte(
      payload in prop::collection::vec(any::<u8>(), 1..512),
    ) {
      let envelope = TransactionEnvelope::from_bytes(payload.clone())?;
      let expected = if payload[0] == 0 {
        TransactionKind::Legacy
      } else {
        TransactionKind::Versioned
      };
      prop_assert_eq!(envelope.kind(), expected);
      prop_assert_eq!(envelope.payload(), payload.as_slice());
    }
  }
}

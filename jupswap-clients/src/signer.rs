use std::sync::Arc;

use anchor_client::solana_sdk::signature::{Keypair, Signature, Signer};
use anchor_client::solana_sdk::transaction::{
  Transaction, VersionedTransaction,
};
use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use jupswap_core::envelope::{TransactionEnvelope, TransactionKind};

use crate::error::SigningError;

/// External signing capability. Implementations may defer to a wallet that
/// prompts the user, so a call can take arbitrarily long or be rejected.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
  /// Returns the fully serialized signed transaction.
  ///
  /// # Errors
  /// * User or wallet rejection
  /// * Payload the signer cannot interpret
  async fn sign(
    &self,
    envelope: &TransactionEnvelope,
  ) -> Result<Vec<u8>, SigningError>;
}

#[async_trait]
impl<T: TransactionSigner + ?Sized> TransactionSigner for Arc<T> {
  async fn sign(
    &self,
    envelope: &TransactionEnvelope,
  ) -> Result<Vec<u8>, SigningError> {
    (**self).sign(envelope).await
  }
}

/// Signs with a local keypair, filling in the keypair's slot among the
/// message's required signatures.
pub struct KeypairSigner {
  keypair: Arc<Keypair>,
}

impl KeypairSigner {
  #[must_use]
  pub fn new(keypair: Arc<Keypair>) -> KeypairSigner {
    KeypairSigner { keypair }
  }

  #[must_use]
  pub fn pubkey(&self) -> Pubkey {
    self.keypair.pubkey()
  }

  fn sign_legacy(&self, payload: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut tx: Transaction = bincode::deserialize(payload)
      .map_err(|e| SigningError::Failed(e.to_string()))?;
    // Unsigned payloads carry no signature slots at all
    let required = usize::from(tx.message.header.num_required_signatures);
    if tx.signatures.len() < required {
      tx.signatures.resize(required, Signature::default());
    }
    let blockhash = tx.message.recent_blockhash;
    tx.try_partial_sign(&[self.keypair.as_ref()], blockhash)
      .map_err(|e| SigningError::Rejected(e.to_string()))?;
    bincode::serialize(&tx).map_err(|e| SigningError::Failed(e.to_string()))
  }

  fn sign_versioned(&self, payload: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut tx: VersionedTransaction = bincode::deserialize(payload)
      .map_err(|e| SigningError::Failed(e.to_string()))?;
    let required = usize::from(tx.message.header().num_required_signatures);
    let position = tx
      .message
      .static_account_keys()
      .iter()
      .take(required)
      .position(|key| *key == self.keypair.pubkey())
      .ok_or_else(|| {
        SigningError::Rejected(format!(
          "{} is not a required signer",
          self.keypair.pubkey()
        ))
      })?;
    if tx.signatures.len() < required {
      tx.signatures.resize(required, Signature::default());
    }
    tx.signatures[position] =
      self.keypair.sign_message(&tx.message.serialize());
    bincode::serialize(&tx).map_err(|e| SigningError::Failed(e.to_string()))
  }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
  async fn sign(
    &self,
    envelope: &TransactionEnvelope,
  ) -> Result<Vec<u8>, SigningError> {
    match envelope.kind() {
      TransactionKind::Legacy => self.sign_legacy(envelope.payload()),
      TransactionKind::Versioned => self.sign_versioned(envelope.payload()),
    }
  }
}

#[cfg(test)]
mod tests {
  use anchor_client::solana_sdk::message::{Message, VersionedMessage};

  use super::*;

  fn unsigned(payer: &Pubkey) -> anyhow::Result<TransactionEnvelope> {
    let message = VersionedMessage::Legacy(Message::new(&[], Some(payer)));
    let tx = VersionedTransaction {
      signatures: vec![Signature::default()],
      message,
    };
    Ok(TransactionEnvelope::from_bytes(bincode::serialize(&tx)?)?)
  }

  #[tokio::test]
  async fn signs_required_slot() -> anyhow::Result<()> {
    let signer = KeypairSigner::new(Arc::new(Keypair::new()));
    let envelope = unsigned(&signer.pubkey())?;
    assert_eq!(envelope.kind(), TransactionKind::Versioned);
    let signed = signer.sign(&envelope).await?;
    let tx: VersionedTransaction = bincode::deserialize(&signed)?;
    assert_ne!(tx.signatures[0], Signature::default());
    assert!(tx.verify_with_results().into_iter().all(|ok| ok));
    Ok(())
  }

  #[tokio::test]
  async fn signs_legacy_without_signature_slots() -> anyhow::Result<()> {
    let signer = KeypairSigner::new(Arc::new(Keypair::new()));
    let tx = Transaction {
      signatures: vec![],
      message: Message::new(&[], Some(&signer.pubkey())),
    };
    let envelope = TransactionEnvelope::from_bytes(bincode::serialize(&tx)?)?;
    assert_eq!(envelope.kind(), TransactionKind::Legacy);
    let signed: Transaction =
      bincode::deserialize(&signer.sign(&envelope).await?)?;
    assert_eq!(signed.signatures.len(), 1);
    assert_ne!(signed.signatures[0], Signature::default());
    signed.verify()?;
    Ok(())
  }

  #[tokio::test]
  async fn legacy_foreign_payer_rejected() -> anyhow::Result<()> {
    let signer = KeypairSigner::new(Arc::new(Keypair::new()));
    let tx = Transaction {
      signatures: vec![],
      message: Message::new(&[], Some(&Pubkey::new_unique())),
    };
    let envelope = TransactionEnvelope::from_bytes(bincode::serialize(&tx)?)?;
    let result = signer.sign(&envelope).await;
    assert!(matches!(result, Err(SigningError::Rejected(_))));
    Ok(())
  }

  #[tokio::test]
  async fn foreign_payer_rejected() -> anyhow::Result<()> {
    let signer = KeypairSigner::new(Arc::new(Keypair::new()));
    let envelope = unsigned(&Pubkey::new_unique())?;
    let result = signer.sign(&envelope).await;
    assert!(matches!(result, Err(SigningError::Rejected(_))));
    Ok(())
  }
}

//! Sign, broadcast, and confirm a built swap transaction.

use std::time::Duration;

use anchor_client::solana_sdk::signature::Signature;
use anchor_lang::prelude::Pubkey;
use jupswap_core::envelope::TransactionEnvelope;
use tracing::{debug, info, warn};

use crate::error::{BroadcastError, SigningError, SwapError};
use crate::rpc::{RpcProvider, SignatureState};
use crate::signer::TransactionSigner;

/// Lifecycle of one submission. Terminal states are `Confirmed` and
/// `Failed`; nothing moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
  Built,
  Signing,
  Signed,
  Broadcasting,
  AwaitingConfirmation,
  Confirmed,
  Failed,
}

impl SubmissionState {
  #[must_use]
  pub const fn is_terminal(self) -> bool {
    matches!(self, SubmissionState::Confirmed | SubmissionState::Failed)
  }
}

/// Outcome of a confirmed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionResult {
  pub signature: Signature,
  /// Output was routed to a wallet other than the requester.
  pub destination_overridden: bool,
}

struct Tracker {
  state: SubmissionState,
}

impl Tracker {
  fn advance(&mut self, next: SubmissionState) {
    debug!(from = ?self.state, to = ?next, "Submission state");
    self.state = next;
  }
}

/// Drives an envelope through signing, a single broadcast, and bounded
/// confirmation polling.
#[derive(Clone)]
pub struct SubmissionCoordinator<R> {
  rpc: R,
  confirmation_timeout: Duration,
  poll_interval: Duration,
}

impl<R: RpcProvider> SubmissionCoordinator<R> {
  #[must_use]
  pub fn new(
    rpc: R,
    confirmation_timeout: Duration,
    poll_interval: Duration,
  ) -> SubmissionCoordinator<R> {
    SubmissionCoordinator {
      rpc,
      confirmation_timeout,
      poll_interval,
    }
  }

  /// Signs and submits `envelope`. The signed bytes are broadcast exactly
  /// once; a timeout leaves the outcome unknown rather than resubmitting.
  ///
  /// # Errors
  /// * Signer rejection or failure (nothing is broadcast)
  /// * Node refuses the transaction
  /// * Transaction lands with an execution error
  /// * No confirmation within the timeout
  pub async fn submit<S: TransactionSigner + ?Sized>(
    &self,
    envelope: TransactionEnvelope,
    signer: &S,
    requested_destination: Option<Pubkey>,
  ) -> Result<SubmissionResult, SwapError> {
    let mut tracker = Tracker {
      state: SubmissionState::Built,
    };
    match self.run(&mut tracker, &envelope, signer).await {
      Ok(signature) => {
        tracker.advance(SubmissionState::Confirmed);
        info!(%signature, "Swap confirmed");
        Ok(SubmissionResult {
          signature,
          destination_overridden: requested_destination.is_some(),
        })
      }
      Err(err) => {
        warn!(stage = ?tracker.state, "Submission failed: {err}");
        tracker.advance(SubmissionState::Failed);
        Err(err)
      }
    }
  }

  async fn run<S: TransactionSigner + ?Sized>(
    &self,
    tracker: &mut Tracker,
    envelope: &TransactionEnvelope,
    signer: &S,
  ) -> Result<Signature, SwapError> {
    tracker.advance(SubmissionState::Signing);
    let signed = signer.sign(envelope).await?;
    if signed.is_empty() {
      return Err(SigningError::Empty.into());
    }
    tracker.advance(SubmissionState::Signed);

    tracker.advance(SubmissionState::Broadcasting);
    let signature = self
      .rpc
      .send_raw_transaction(&signed)
      .await
      .map_err(|e| BroadcastError {
        message: format!("{e:#}"),
      })?;
    info!(%signature, "Transaction broadcast");

    tracker.advance(SubmissionState::AwaitingConfirmation);
    self.await_confirmation(signature).await?;
    Ok(signature)
  }

  /// Polls the signature status until confirmed, failed, or timed out.
  /// Status query errors are logged and polling continues.
  ///
  /// # Errors
  /// * Transaction landed with an execution error
  /// * Timeout elapsed
  pub async fn await_confirmation(
    &self,
    signature: Signature,
  ) -> Result<(), SwapError> {
    let poll = async {
      loop {
        match self.rpc.get_signature_state(&signature).await {
          Ok(SignatureState::Confirmed) => return Ok(()),
          Ok(SignatureState::Failed(reason)) => {
            return Err(SwapError::TransactionFailed { signature, reason });
          }
          Ok(SignatureState::Pending) => {}
          Err(e) => warn!(%signature, "Signature status query failed: {e:#}"),
        }
        tokio::time::sleep(self.poll_interval).await;
      }
    };
    tokio::time::timeout(self.confirmation_timeout, poll)
      .await
      .map_err(|_| SwapError::ConfirmationTimeout {
        signature,
        timeout: self.confirmation_timeout,
      })?
  }
}

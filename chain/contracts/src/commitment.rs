//! Commitment Store: processed withdrawal ids and challenge timestamps
//!
//! Every accepted withdrawal id is recorded here exactly once. Large
//! withdrawals additionally keep a pending record (with its challenge start)
//! until they are completed or cancelled by a fraud override.

use bridge_types::ids::{AccountId, WithdrawalId};
use bridge_types::numeric::{canonical_amount_bytes, Amount};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::collections::{HashMap, HashSet};

use crate::errors::CommitmentError;

const WITHDRAWAL_ID_DOMAIN: &[u8] = b"bridge.withdrawal.v1";

/// Derive the withdrawal identifier for (owner, amount, nonce, chain id).
///
/// Every field enters the preimage at a fixed width, so changing any one of
/// them changes the id. The chain id keeps an authorization from being
/// replayed on another deployment.
pub fn derive_id(owner: &AccountId, amount: Amount, nonce: u64, chain_id: u64) -> WithdrawalId {
    let mut hasher = Sha256::new();
    hasher.update(WITHDRAWAL_ID_DOMAIN);
    hasher.update(owner.as_bytes());
    hasher.update(canonical_amount_bytes(amount));
    hasher.update(nonce.to_be_bytes());
    hasher.update(chain_id.to_be_bytes());
    WithdrawalId::from_bytes(hasher.finalize().into())
}

/// Lifecycle of a withdrawal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    /// Never accepted
    Nonexistent,
    /// Large withdrawal waiting out its challenge period
    PendingChallenge,
    /// Paid out
    Finalized,
    /// Cancelled by a fraud override; funds stay in the owner's balance
    Cancelled,
}

/// A large withdrawal waiting out its challenge period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingWithdrawal {
    pub id: WithdrawalId,
    pub owner: AccountId,
    pub amount: Amount,
    pub nonce: u64,
    pub initiated_at: i64,
}

/// Complete per-id state, used to undo an aborted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordSnapshot {
    processed: bool,
    pending: Option<PendingWithdrawal>,
    cancelled: bool,
}

/// Processed set plus pending challenge records.
#[derive(Debug, Clone, Default)]
pub struct CommitmentStore {
    processed: HashSet<WithdrawalId>,
    pending: HashMap<WithdrawalId, PendingWithdrawal>,
    cancelled: HashSet<WithdrawalId>,
}

impl CommitmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_processed(&self, id: &WithdrawalId) -> bool {
        self.processed.contains(id)
    }

    /// Record `id` as accepted. Fails if it already was.
    pub fn mark_processed(&mut self, id: WithdrawalId) -> Result<(), CommitmentError> {
        if !self.processed.insert(id) {
            return Err(CommitmentError::AlreadyProcessed { id });
        }
        Ok(())
    }

    /// Open the challenge period for a large withdrawal.
    pub fn set_challenge_start(&mut self, record: PendingWithdrawal) {
        self.pending.insert(record.id, record);
    }

    /// Close the challenge period, returning the pending record.
    pub fn clear_challenge_start(
        &mut self,
        id: &WithdrawalId,
    ) -> Result<PendingWithdrawal, CommitmentError> {
        self.pending
            .remove(id)
            .ok_or(CommitmentError::NotPending { id: *id })
    }

    /// Challenge start for `id`, or `None` if it is not pending.
    pub fn challenge_start(&self, id: &WithdrawalId) -> Option<i64> {
        self.pending.get(id).map(|p| p.initiated_at)
    }

    pub fn pending(&self, id: &WithdrawalId) -> Option<&PendingWithdrawal> {
        self.pending.get(id)
    }

    /// Pending withdrawals belonging to `owner`, oldest first.
    pub fn pending_for(&self, owner: &AccountId) -> Vec<&PendingWithdrawal> {
        let mut records: Vec<_> = self
            .pending
            .values()
            .filter(|p| p.owner == *owner)
            .collect();
        records.sort_by_key(|p| (p.initiated_at, p.nonce));
        records
    }

    /// Mark a (no longer pending) id as cancelled by fraud override.
    pub fn mark_cancelled(&mut self, id: WithdrawalId) {
        self.cancelled.insert(id);
    }

    pub fn status(&self, id: &WithdrawalId) -> WithdrawalStatus {
        if !self.processed.contains(id) {
            WithdrawalStatus::Nonexistent
        } else if self.pending.contains_key(id) {
            WithdrawalStatus::PendingChallenge
        } else if self.cancelled.contains(id) {
            WithdrawalStatus::Cancelled
        } else {
            WithdrawalStatus::Finalized
        }
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn snapshot(&self, id: &WithdrawalId) -> RecordSnapshot {
        RecordSnapshot {
            processed: self.processed.contains(id),
            pending: self.pending.get(id).cloned(),
            cancelled: self.cancelled.contains(id),
        }
    }

    pub(crate) fn restore(&mut self, id: WithdrawalId, snapshot: RecordSnapshot) {
        if snapshot.processed {
            self.processed.insert(id);
        } else {
            self.processed.remove(&id);
        }
        match snapshot.pending {
            Some(record) => {
                self.pending.insert(id, record);
            }
            None => {
                self.pending.remove(&id);
            }
        }
        if snapshot.cancelled {
            self.cancelled.insert(id);
        } else {
            self.cancelled.remove(&id);
        }
    }
}

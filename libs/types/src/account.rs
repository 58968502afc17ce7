//! Per-owner account state held by the bridge ledger

use crate::numeric::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance and nonce of a single owner.
///
/// Invariants: `balance >= 0`; `nonce` never decreases. Created
/// zero-initialized on first deposit and never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountState {
    /// Total deposited minus settled withdrawals
    pub balance: Amount,
    /// Count of nonce-issuing operations (deposits and withdrawal initiations)
    pub nonce: u64,
}

impl AccountState {
    /// Whether the balance covers `amount`.
    pub fn covers(&self, amount: Amount) -> bool {
        self.balance >= amount
    }

    /// The nonce most recently issued to this owner, which the next
    /// withdrawal authorization must reference. Zero before any issuance.
    pub fn authorization_nonce(&self) -> u64 {
        self.nonce.saturating_sub(1)
    }

    /// Whether the account has never been touched.
    pub fn is_fresh(&self) -> bool {
        self.balance == Decimal::ZERO && self.nonce == 0
    }
}

//! Account Ledger: per-owner balance and nonce
//!
//! Balances only move through `credit` (deposits) and `debit` (settled
//! withdrawals); both use checked arithmetic and leave the account untouched
//! on failure. Nonces only move forward.

use bridge_types::account::AccountState;
use bridge_types::ids::AccountId;
use bridge_types::numeric::Amount;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::LedgerError;

/// Owner → account state. Accounts are created on first touch and never
/// removed.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    accounts: HashMap<AccountId, AccountState>,
}

impl AccountLedger {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Snapshot of an owner's account; unknown owners read as zero.
    pub fn account(&self, owner: &AccountId) -> AccountState {
        self.accounts.get(owner).copied().unwrap_or_default()
    }

    pub fn balance(&self, owner: &AccountId) -> Amount {
        self.account(owner).balance
    }

    /// Current nonce counter for `owner`.
    pub fn next_nonce(&self, owner: &AccountId) -> u64 {
        self.account(owner).nonce
    }

    /// Sum of all balances (the engine's liabilities to owners).
    pub fn total_balance(&self) -> Amount {
        self.accounts.values().map(|a| a.balance).sum()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // ───────────────────────── Mutations ─────────────────────────

    /// Increase `owner`'s balance. Returns the new balance.
    pub fn credit(&mut self, owner: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let account = self.accounts.entry(owner).or_default();
        let new_balance = account
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        account.balance = new_balance;
        Ok(new_balance)
    }

    /// Decrease `owner`'s balance. Returns the new balance.
    ///
    /// Must only be called once every authorization check for the enclosing
    /// operation has passed, and before funds leave the engine.
    pub fn debit(&mut self, owner: &AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let available = self.balance(owner);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        let new_balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        if let Some(account) = self.accounts.get_mut(owner) {
            account.balance = new_balance;
        }
        Ok(new_balance)
    }

    /// Advance `owner`'s nonce by exactly one. Returns the pre-advance value.
    pub fn advance_nonce(&mut self, owner: AccountId) -> Result<u64, LedgerError> {
        self.advance_nonce_by(owner, 1)
    }

    /// Advance `owner`'s nonce by `count`. Returns the pre-advance value.
    pub fn advance_nonce_by(&mut self, owner: AccountId, count: u64) -> Result<u64, LedgerError> {
        let account = self.accounts.entry(owner).or_default();
        let previous = account.nonce;
        account.nonce = previous.checked_add(count).ok_or(LedgerError::Overflow)?;
        Ok(previous)
    }

    /// Reinstate a snapshot taken before an aborted operation.
    pub(crate) fn restore(&mut self, owner: AccountId, snapshot: AccountState) {
        if snapshot.is_fresh() {
            self.accounts.remove(&owner);
        } else {
            self.accounts.insert(owner, snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Credit tests ───

    #[test]
    fn test_credit_creates_account() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();

        let balance = ledger.credit(owner, Decimal::ONE).unwrap();
        assert_eq!(balance, Decimal::ONE);
        assert_eq!(ledger.account(&owner).nonce, 0);
        assert_eq!(ledger.account_count(), 1);
    }

    #[test]
    fn test_credit_accumulates() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        ledger.credit(owner, Decimal::from(3)).unwrap();
        ledger.credit(owner, Decimal::from(4)).unwrap();
        assert_eq!(ledger.balance(&owner), Decimal::from(7));
    }

    #[test]
    fn test_credit_rejects_non_positive() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        assert_eq!(
            ledger.credit(owner, Decimal::ZERO),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            ledger.credit(owner, Decimal::from(-1)),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn test_credit_overflow_leaves_balance() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        ledger.credit(owner, Decimal::MAX).unwrap();
        assert_eq!(ledger.credit(owner, Decimal::ONE), Err(LedgerError::Overflow));
        assert_eq!(ledger.balance(&owner), Decimal::MAX);
    }

    // ─── Debit tests ───

    #[test]
    fn test_debit_success() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        ledger.credit(owner, Decimal::from(10)).unwrap();
        assert_eq!(ledger.debit(&owner, Decimal::from(3)), Ok(Decimal::from(7)));
    }

    #[test]
    fn test_debit_insufficient() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        ledger.credit(owner, Decimal::from(8)).unwrap();
        assert_eq!(
            ledger.debit(&owner, Decimal::from(10)),
            Err(LedgerError::InsufficientBalance {
                required: Decimal::from(10),
                available: Decimal::from(8),
            })
        );
        assert_eq!(ledger.balance(&owner), Decimal::from(8));
    }

    #[test]
    fn test_debit_rejects_negative() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        ledger.credit(owner, Decimal::ONE).unwrap();
        assert_eq!(ledger.debit(&owner, Decimal::from(-5)), Err(LedgerError::InvalidAmount));
        assert_eq!(ledger.balance(&owner), Decimal::ONE);
    }

    #[test]
    fn test_debit_unknown_owner() {
        let mut ledger = AccountLedger::new();
        let result = ledger.debit(&AccountId::new(), Decimal::ONE);
        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
    }

    // ─── Nonce tests ───

    #[test]
    fn test_advance_nonce_returns_previous() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        assert_eq!(ledger.advance_nonce(owner), Ok(0));
        assert_eq!(ledger.advance_nonce(owner), Ok(1));
        assert_eq!(ledger.next_nonce(&owner), 2);
    }

    #[test]
    fn test_advance_nonce_by_batch() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        ledger.advance_nonce(owner).unwrap();
        assert_eq!(ledger.advance_nonce_by(owner, 3), Ok(1));
        assert_eq!(ledger.next_nonce(&owner), 4);
    }

    // ─── Restore / totals ───

    #[test]
    fn test_restore_snapshot() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        ledger.credit(owner, Decimal::from(5)).unwrap();
        let snapshot = ledger.account(&owner);

        ledger.debit(&owner, Decimal::from(2)).unwrap();
        ledger.advance_nonce(owner).unwrap();
        ledger.restore(owner, snapshot);

        assert_eq!(ledger.account(&owner), snapshot);
    }

    #[test]
    fn test_restore_fresh_removes_account() {
        let mut ledger = AccountLedger::new();
        let owner = AccountId::new();
        let snapshot = ledger.account(&owner);
        ledger.credit(owner, Decimal::ONE).unwrap();
        ledger.restore(owner, snapshot);
        assert_eq!(ledger.account_count(), 0);
    }

    #[test]
    fn test_total_balance() {
        let mut ledger = AccountLedger::new();
        ledger.credit(AccountId::new(), Decimal::from(10)).unwrap();
        ledger.credit(AccountId::new(), Decimal::from(5)).unwrap();
        assert_eq!(ledger.total_balance(), Decimal::from(15));
    }
}

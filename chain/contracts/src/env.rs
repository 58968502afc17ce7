//! Execution environment collaborators: clock and funds transfer

use bridge_types::ids::AccountId;
use bridge_types::numeric::Amount;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::withdrawal::WithdrawalEngine;

/// Source of the current timestamp (unix seconds).
pub trait Clock: fmt::Debug + Send {
    fn now(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Externally driven clock, e.g. the block time of a replayed chain.
///
/// Clones share the same underlying time, so a host can keep one handle and
/// move another into the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, timestamp: i64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(secs))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Moves funds out of the engine to a receiver.
///
/// The receiver's own logic runs inside `transfer` and is handed the engine,
/// so it may attempt to call back in; every mutating entry point is closed
/// while a payout is in flight. Returning `false` aborts the enclosing
/// operation and rolls back all of its effects.
pub trait FundsTransfer {
    fn transfer(&mut self, engine: &mut WithdrawalEngine, to: AccountId, amount: Amount) -> bool;
}

/// In-memory payout rail that records every transfer it performs.
#[derive(Debug, Clone, Default)]
pub struct PayoutLog {
    payouts: Vec<(AccountId, Amount)>,
}

impl PayoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payouts(&self) -> &[(AccountId, Amount)] {
        &self.payouts
    }

    /// Total paid to `owner` so far.
    pub fn paid_to(&self, owner: &AccountId) -> Amount {
        self.payouts
            .iter()
            .filter(|(to, _)| to == owner)
            .map(|(_, amount)| *amount)
            .sum()
    }
}

impl FundsTransfer for PayoutLog {
    fn transfer(&mut self, _engine: &mut WithdrawalEngine, to: AccountId, amount: Amount) -> bool {
        self.payouts.push((to, amount));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();
        handle.advance(500);
        assert_eq!(clock.now(), 1_500);
        handle.set(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn test_manual_clock_advance_saturates() {
        let clock = ManualClock::new(i64::MAX - 10);
        clock.advance(100);
        assert_eq!(clock.now(), i64::MAX);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now() > 1_577_836_800);
    }
}

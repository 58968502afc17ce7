//! Shared security primitives for the withdrawal engine
//!
//! Reentrancy guard, pause switch and the single-holder operator role. Each
//! is a plain flag or identity; the engine decides which error to surface.

use bridge_types::ids::AccountId;

/// Call-in-progress flag rejecting nested entry into protected operations.
///
/// The engine enters the guard at the top of every state-mutating
/// operation and exits it on every return path. A funds-transfer receiver
/// that calls back into the engine while a payout is in flight finds the
/// guard held.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    entered: bool,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter the protected section. Returns `false` if already entered.
    pub fn enter(&mut self) -> bool {
        if self.entered {
            return false;
        }
        self.entered = true;
        true
    }

    /// Leave the protected section.
    pub fn exit(&mut self) {
        self.entered = false;
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

/// Pause switch gating user-facing mutations.
#[derive(Debug, Clone, Default)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    pub fn new() -> Self {
        Self { paused: false }
    }

    /// Pause. Returns `false` if already paused.
    pub fn pause(&mut self) -> bool {
        !std::mem::replace(&mut self.paused, true)
    }

    /// Unpause. Returns `false` if not paused.
    pub fn unpause(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Operator capability: a single holder fixed at construction.
///
/// The operator publishes Merkle roots, pauses the engine and submits fraud
/// overrides. Fraud assertions are trusted as-is.
#[derive(Debug, Clone)]
pub struct OperatorRole {
    holder: AccountId,
}

impl OperatorRole {
    pub fn new(holder: AccountId) -> Self {
        Self { holder }
    }

    /// Whether `caller` holds the operator capability.
    pub fn authorizes(&self, caller: &AccountId) -> bool {
        self.holder == *caller
    }

    pub fn holder(&self) -> AccountId {
        self.holder
    }
}

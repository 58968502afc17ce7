//! Withdrawal authorization engine for the layer-2 bridge
//!
//! Users deposit into the bridge; an off-chain operator periodically publishes
//! a Merkle root over the set of authorized withdrawals; users withdraw by
//! presenting a proof against the current root. Large withdrawals wait out a
//! challenge period during which the operator can cancel them.
//!
//! # Modules
//! - `ledger`: per-owner balances and monotonic nonces
//! - `commitment`: withdrawal ids, processed set, pending challenge records
//! - `merkle`: leaf/node hashing, proof verification, tree building
//! - `withdrawal`: the state machine tying the above together
//! - `security`: reentrancy guard, pause guard, operator role
//! - `env`: clock and funds-transfer collaborators
//! - `config`: engine configuration
//! - `events`: sequenced event stream for external monitors
//! - `errors`: error taxonomy

pub mod commitment;
pub mod config;
pub mod env;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod merkle;
pub mod security;
pub mod withdrawal;

pub use config::EngineConfig;
pub use env::{Clock, FundsTransfer, ManualClock, PayoutLog, SystemClock};
pub use errors::BridgeError;
pub use withdrawal::{WithdrawalEngine, WithdrawalOutcome};

/// Engine interface version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";

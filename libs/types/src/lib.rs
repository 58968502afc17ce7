//! Types library for the layer-2 bridge
//!
//! Core type definitions shared by the withdrawal authorization engine and
//! anything that observes it (monitors, operator tooling).
//!
//! # Version
//! v1.0.0
//!
//! # Modules
//! - `ids`: Identifiers (AccountId, Digest, WithdrawalId)
//! - `numeric`: Fixed-point amounts
//! - `account`: Per-owner balance and nonce state

pub mod ids;
pub mod numeric;
pub mod account;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::account::*;
}

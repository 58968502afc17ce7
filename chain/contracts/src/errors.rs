//! Contract-specific error types
//!
//! Component errors (`LedgerError`, `CommitmentError`, `ConfigError`) fold into
//! the flat `BridgeError` surface so callers see one stable kind per cause.

use bridge_types::ids::WithdrawalId;
use bridge_types::numeric::Amount;
use thiserror::Error;

/// Account ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Arithmetic overflow in ledger update")]
    Overflow,
}

/// Commitment store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommitmentError {
    #[error("Withdrawal already processed: {id}")]
    AlreadyProcessed { id: WithdrawalId },

    #[error("Withdrawal not pending: {id}")]
    NotPending { id: WithdrawalId },
}

/// Engine configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Large withdrawal threshold must be positive")]
    InvalidThreshold,

    #[error("Challenge period must not be negative: {0}s")]
    InvalidChallengePeriod(i64),

    #[error("Config parse error: {0}")]
    Parse(String),
}

/// Errors surfaced by the withdrawal engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Withdrawal already processed: {id}")]
    AlreadyProcessed { id: WithdrawalId },

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("Invalid Merkle proof")]
    InvalidProof,

    #[error("Challenge period not elapsed: available at {available_at}")]
    TooEarly { available_at: i64 },

    #[error("Withdrawal not pending: {id}")]
    NotPending { id: WithdrawalId },

    #[error("Unauthorized: caller is not the operator")]
    Unauthorized,

    #[error("Engine is paused")]
    Paused,

    #[error("Engine is not paused")]
    NotPaused,

    #[error("Funds transfer failed")]
    TransferFailed,

    #[error("Batch arrays have mismatched lengths: amounts {amounts}, nonces {nonces}, proofs {proofs}")]
    ArrayLengthMismatch {
        amounts: usize,
        nonces: usize,
        proofs: usize,
    },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<LedgerError> for BridgeError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount => BridgeError::InvalidAmount,
            LedgerError::InsufficientBalance {
                required,
                available,
            } => BridgeError::InsufficientBalance {
                required,
                available,
            },
            LedgerError::Overflow => BridgeError::Overflow,
        }
    }
}

impl From<CommitmentError> for BridgeError {
    fn from(err: CommitmentError) -> Self {
        match err {
            CommitmentError::AlreadyProcessed { id } => BridgeError::AlreadyProcessed { id },
            CommitmentError::NotPending { id } => BridgeError::NotPending { id },
        }
    }
}

impl BridgeError {
    /// Whether retrying the same call later may succeed without any change
    /// of inputs (the challenge period is still running, or the engine is
    /// paused).
    pub fn is_retryable(&self) -> bool {
        matches!(self, BridgeError::TooEarly { .. } | BridgeError::Paused)
    }
}

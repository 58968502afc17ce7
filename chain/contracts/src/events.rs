//! Bridge events
//!
//! Append-only records emitted by engine operations for external monitors.
//! Nothing inside the engine reads them back. Each record carries a global
//! sequence number (strictly increasing, no gaps across accepted operations)
//! and the engine timestamp at emission.

use bridge_types::ids::{AccountId, Digest, WithdrawalId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Funds credited to an owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub owner: AccountId,
    pub amount: Decimal,
    /// Pre-advance nonce; the value a withdrawal of these funds references
    pub nonce: u64,
}

/// Withdrawal authorization accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalInitiated {
    pub id: WithdrawalId,
    pub owner: AccountId,
    pub amount: Decimal,
    pub nonce: u64,
    /// Whether the withdrawal must wait out the challenge period
    pub deferred: bool,
}

/// Withdrawal paid out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalCompleted {
    pub id: WithdrawalId,
    pub owner: AccountId,
    pub amount: Decimal,
}

/// New Merkle root published by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootUpdated {
    pub previous: Digest,
    pub root: Digest,
}

/// Pending withdrawal cancelled by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudOverrideSubmitted {
    pub id: WithdrawalId,
    pub owner: AccountId,
    pub amount: Decimal,
}

/// Enum wrapper for all bridge events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeEvent {
    Deposited(Deposited),
    WithdrawalInitiated(WithdrawalInitiated),
    WithdrawalCompleted(WithdrawalCompleted),
    RootUpdated(RootUpdated),
    FraudOverrideSubmitted(FraudOverrideSubmitted),
    Paused { by: AccountId },
    Unpaused { by: AccountId },
}

impl BridgeEvent {
    pub fn label(&self) -> &'static str {
        match self {
            BridgeEvent::Deposited(_) => "deposited",
            BridgeEvent::WithdrawalInitiated(_) => "withdrawal_initiated",
            BridgeEvent::WithdrawalCompleted(_) => "withdrawal_completed",
            BridgeEvent::RootUpdated(_) => "root_updated",
            BridgeEvent::FraudOverrideSubmitted(_) => "fraud_override_submitted",
            BridgeEvent::Paused { .. } => "paused",
            BridgeEvent::Unpaused { .. } => "unpaused",
        }
    }
}

/// A sequenced, timestamped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub timestamp: i64,
    pub event: BridgeEvent,
}

/// Append-only event stream with a global sequence counter.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    last_sequence: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assigning the next sequence number.
    pub fn emit(&mut self, timestamp: i64, event: BridgeEvent) -> EventRecord {
        self.last_sequence += 1;
        let record = EventRecord {
            sequence: self.last_sequence,
            timestamp,
            event,
        };
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Take all buffered records; sequencing continues where it left off.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Discard everything emitted after `sequence`.
    pub(crate) fn rewind(&mut self, sequence: u64) {
        self.records.retain(|r| r.sequence <= sequence);
        self.last_sequence = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposited_serialization() {
        let event = Deposited {
            owner: AccountId::new(),
            amount: Decimal::new(5, 1),
            nonce: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: Deposited = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_root_updated_serializes_hex() {
        let event = BridgeEvent::RootUpdated(RootUpdated {
            previous: Digest::ZERO,
            root: Digest::from_bytes([0x11; 32]),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(&"11".repeat(32)));
        let deser: BridgeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_log_sequences() {
        let mut log = EventLog::new();
        let by = AccountId::new();
        let first = log.emit(100, BridgeEvent::Paused { by });
        let second = log.emit(101, BridgeEvent::Unpaused { by });
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(second.event.label(), "unpaused");
    }

    #[test]
    fn test_drain_keeps_sequence() {
        let mut log = EventLog::new();
        let by = AccountId::new();
        log.emit(100, BridgeEvent::Paused { by });

        let drained = log.drain();
        assert_eq!(drained.len(), 1);
        assert!(log.records().is_empty());

        let next = log.emit(101, BridgeEvent::Unpaused { by });
        assert_eq!(next.sequence, 2);
    }

    #[test]
    fn test_rewind_discards_later_records() {
        let mut log = EventLog::new();
        let by = AccountId::new();
        log.emit(100, BridgeEvent::Paused { by });
        let checkpoint = log.last_sequence();
        log.emit(101, BridgeEvent::Unpaused { by });

        log.rewind(checkpoint);
        assert_eq!(log.records().len(), 1);
        assert_eq!(log.emit(102, BridgeEvent::Unpaused { by }).sequence, 2);
    }
}

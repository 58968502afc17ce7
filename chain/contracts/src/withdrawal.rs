//! Withdrawal State Machine: deposit, initiate, complete, batch, operator controls
//!
//! Lifecycle of a withdrawal id:
//! `Nonexistent → PendingChallenge → Finalized` for large amounts,
//! `Nonexistent → Finalized` below the large threshold, and
//! `PendingChallenge → Cancelled` through an operator fraud override.
//!
//! Every operation evaluates all of its preconditions before touching state.
//! Effects (processed flag, nonce, debit) are applied before funds leave the
//! engine; a failed transfer rolls the whole operation back. All mutating
//! entry points share one reentrancy guard.
//!
//! A withdrawal claim references the nonce most recently issued to the owner
//! (the one reported in the deposit event), so after a deposit that moved the
//! counter from `n` to `n + 1`, the next withdrawal claims `n`.

use bridge_types::account::AccountState;
use bridge_types::ids::{AccountId, Digest, WithdrawalId};
use bridge_types::numeric::Amount;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::commitment::{
    derive_id, CommitmentStore, PendingWithdrawal, RecordSnapshot, WithdrawalStatus,
};
use crate::config::EngineConfig;
use crate::env::{Clock, FundsTransfer, SystemClock};
use crate::errors::{BridgeError, ConfigError};
use crate::events::{
    BridgeEvent, Deposited, EventLog, EventRecord, FraudOverrideSubmitted, RootUpdated,
    WithdrawalCompleted, WithdrawalInitiated,
};
use crate::ledger::AccountLedger;
use crate::merkle;
use crate::security::{OperatorRole, PauseGuard, ReentrancyGuard};

/// Result of an accepted withdrawal initiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    /// Paid out in the same call
    Settled { id: WithdrawalId },
    /// Waiting out the challenge period; completable at `available_at`
    Deferred { id: WithdrawalId, available_at: i64 },
}

impl WithdrawalOutcome {
    pub fn id(&self) -> WithdrawalId {
        match self {
            WithdrawalOutcome::Settled { id } | WithdrawalOutcome::Deferred { id, .. } => *id,
        }
    }
}

/// State touched by one operation, captured before its effects.
struct Checkpoint {
    owner: AccountId,
    account: AccountState,
    records: Vec<(WithdrawalId, RecordSnapshot)>,
    custody: Amount,
    sequence: u64,
}

/// The withdrawal authorization engine.
#[derive(Debug)]
pub struct WithdrawalEngine {
    config: EngineConfig,
    ledger: AccountLedger,
    commitments: CommitmentStore,
    merkle_root: Digest,
    /// Funds held: deposits minus payouts
    custody: Amount,
    operator: OperatorRole,
    pause_guard: PauseGuard,
    reentrancy_guard: ReentrancyGuard,
    clock: Box<dyn Clock>,
    events: EventLog,
}

impl WithdrawalEngine {
    /// Create an engine with an operator, a validated config and a clock.
    pub fn new(
        operator: AccountId,
        config: EngineConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(operator, config, Box::new(clock)))
    }

    /// Create an engine with the default config and the system clock.
    pub fn with_defaults(operator: AccountId) -> Self {
        Self::build(operator, EngineConfig::default(), Box::new(SystemClock))
    }

    fn build(operator: AccountId, config: EngineConfig, clock: Box<dyn Clock>) -> Self {
        info!(
            operator = %operator,
            chain_id = config.chain_id,
            large_threshold = %config.large_threshold,
            challenge_period_secs = config.challenge_period_secs,
            "WithdrawalEngine initialized"
        );

        Self {
            config,
            ledger: AccountLedger::new(),
            commitments: CommitmentStore::new(),
            merkle_root: Digest::ZERO,
            custody: Decimal::ZERO,
            operator: OperatorRole::new(operator),
            pause_guard: PauseGuard::new(),
            reentrancy_guard: ReentrancyGuard::new(),
            clock,
            events: EventLog::new(),
        }
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Credit `amount` to `owner` and issue the owner's next nonce.
    ///
    /// The returned `Deposited` event carries the issued (pre-advance) nonce,
    /// which a withdrawal of these funds references.
    pub fn deposit(&mut self, owner: AccountId, amount: Amount) -> Result<EventRecord, BridgeError> {
        self.guarded("deposit", |engine| {
            engine.ensure_active()?;
            if amount <= Decimal::ZERO {
                return Err(BridgeError::InvalidAmount);
            }
            let custody = engine
                .custody
                .checked_add(amount)
                .ok_or(BridgeError::Overflow)?;
            let now = engine.clock.now();

            engine.atomically(owner, &[], |engine| {
                engine.ledger.credit(owner, amount)?;
                let nonce = engine.ledger.advance_nonce(owner)?;
                engine.custody = custody;

                let record = engine.events.emit(
                    now,
                    BridgeEvent::Deposited(Deposited {
                        owner,
                        amount,
                        nonce,
                    }),
                );
                info!(owner = %owner, amount = %amount, nonce, "Deposit credited");
                Ok(record)
            })
        })
    }

    // ───────────────────────── Withdrawals ─────────────────────────

    /// Initiate a withdrawal authorized by a Merkle proof.
    ///
    /// Below the large threshold the amount is debited and transferred in
    /// this call. At or above it, the withdrawal enters its challenge period
    /// and the balance is left untouched until `complete_withdrawal`.
    pub fn initiate_withdrawal(
        &mut self,
        owner: AccountId,
        amount: Amount,
        claimed_nonce: u64,
        proof: &[Digest],
        transfer: &mut dyn FundsTransfer,
    ) -> Result<WithdrawalOutcome, BridgeError> {
        self.guarded("initiate_withdrawal", |engine| {
            engine.ensure_active()?;
            if amount < Decimal::ZERO {
                return Err(BridgeError::InvalidAmount);
            }
            let account = engine.ledger.account(&owner);
            if !account.covers(amount) {
                return Err(BridgeError::InsufficientBalance {
                    required: amount,
                    available: account.balance,
                });
            }
            let id = engine.authorize(
                &owner,
                amount,
                claimed_nonce,
                account.authorization_nonce(),
                proof,
            )?;
            let now = engine.clock.now();
            let deferred = engine.config.is_large(amount);

            engine.atomically(owner, &[id], |engine| {
                engine.commitments.mark_processed(id)?;
                engine.ledger.advance_nonce(owner)?;
                engine.events.emit(
                    now,
                    BridgeEvent::WithdrawalInitiated(WithdrawalInitiated {
                        id,
                        owner,
                        amount,
                        nonce: claimed_nonce,
                        deferred,
                    }),
                );

                if deferred {
                    let available_at = now.saturating_add(engine.config.challenge_period_secs);
                    engine.commitments.set_challenge_start(PendingWithdrawal {
                        id,
                        owner,
                        amount,
                        nonce: claimed_nonce,
                        initiated_at: now,
                    });
                    info!(
                        owner = %owner,
                        amount = %amount,
                        id = %id.short(),
                        available_at,
                        "Large withdrawal entered challenge period"
                    );
                    return Ok(WithdrawalOutcome::Deferred { id, available_at });
                }

                engine.settle(owner, amount, &[(id, amount)], now, transfer)?;
                info!(owner = %owner, amount = %amount, id = %id.short(), "Withdrawal settled");
                Ok(WithdrawalOutcome::Settled { id })
            })
        })
    }

    /// Finalize a large withdrawal once its challenge period has elapsed.
    ///
    /// The balance is re-checked here because it may have changed since
    /// initiation.
    pub fn complete_withdrawal(
        &mut self,
        owner: AccountId,
        amount: Amount,
        nonce: u64,
        transfer: &mut dyn FundsTransfer,
    ) -> Result<WithdrawalId, BridgeError> {
        self.guarded("complete_withdrawal", |engine| {
            engine.ensure_active()?;
            if amount < Decimal::ZERO {
                return Err(BridgeError::InvalidAmount);
            }
            let id = derive_id(&owner, amount, nonce, engine.config.chain_id);
            let started = match engine.commitments.challenge_start(&id) {
                Some(started) if engine.commitments.is_processed(&id) => started,
                _ => return Err(BridgeError::NotPending { id }),
            };

            let available_at = started.saturating_add(engine.config.challenge_period_secs);
            let now = engine.clock.now();
            if now < available_at {
                return Err(BridgeError::TooEarly { available_at });
            }

            let available = engine.ledger.balance(&owner);
            if available < amount {
                warn!(
                    owner = %owner,
                    required = %amount,
                    available = %available,
                    "Balance dropped below pending withdrawal"
                );
                return Err(BridgeError::InsufficientBalance {
                    required: amount,
                    available,
                });
            }

            engine.atomically(owner, &[id], |engine| {
                engine.commitments.clear_challenge_start(&id)?;
                engine.settle(owner, amount, &[(id, amount)], now, transfer)?;
                info!(owner = %owner, amount = %amount, id = %id.short(), "Large withdrawal completed");
                Ok(id)
            })
        })
    }

    /// Settle several withdrawals for one owner in a single transfer.
    ///
    /// Entry `i` must claim `authorization_nonce + i`. The batch total is
    /// checked against the balance, and every entry is authorized, before
    /// anything is written; if any check fails nothing is applied. Batch
    /// entries settle immediately regardless of size.
    pub fn batch_withdraw(
        &mut self,
        owner: AccountId,
        amounts: &[Amount],
        nonces: &[u64],
        proofs: &[Vec<Digest>],
        transfer: &mut dyn FundsTransfer,
    ) -> Result<Vec<WithdrawalId>, BridgeError> {
        self.guarded("batch_withdraw", |engine| {
            engine.ensure_active()?;
            if amounts.len() != nonces.len() || amounts.len() != proofs.len() {
                return Err(BridgeError::ArrayLengthMismatch {
                    amounts: amounts.len(),
                    nonces: nonces.len(),
                    proofs: proofs.len(),
                });
            }
            if amounts.is_empty() {
                return Ok(Vec::new());
            }
            if amounts.iter().any(|amount| *amount < Decimal::ZERO) {
                return Err(BridgeError::InvalidAmount);
            }

            let total = amounts
                .iter()
                .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))
                .ok_or(BridgeError::Overflow)?;
            let account = engine.ledger.account(&owner);
            if !account.covers(total) {
                return Err(BridgeError::InsufficientBalance {
                    required: total,
                    available: account.balance,
                });
            }

            let base = account.authorization_nonce();
            let mut ids = Vec::with_capacity(amounts.len());
            for (i, ((amount, nonce), proof)) in amounts.iter().zip(nonces).zip(proofs).enumerate() {
                let expected = base.checked_add(i as u64).ok_or(BridgeError::Overflow)?;
                ids.push(engine.authorize(&owner, *amount, *nonce, expected, proof)?);
            }
            let now = engine.clock.now();

            engine.atomically(owner, &ids, |engine| {
                for ((id, amount), nonce) in ids.iter().zip(amounts).zip(nonces) {
                    engine.commitments.mark_processed(*id)?;
                    engine.events.emit(
                        now,
                        BridgeEvent::WithdrawalInitiated(WithdrawalInitiated {
                            id: *id,
                            owner,
                            amount: *amount,
                            nonce: *nonce,
                            deferred: false,
                        }),
                    );
                }
                engine.ledger.advance_nonce_by(owner, ids.len() as u64)?;

                let payouts: Vec<(WithdrawalId, Amount)> =
                    ids.iter().copied().zip(amounts.iter().copied()).collect();
                engine.settle(owner, total, &payouts, now, transfer)?;
                info!(
                    owner = %owner,
                    entries = ids.len(),
                    total = %total,
                    "Batch withdrawal settled"
                );
                Ok(())
            })?;

            Ok(ids)
        })
    }

    // ───────────────────────── Operator ─────────────────────────

    /// Replace the Merkle root. Allowed while paused.
    pub fn publish_root(&mut self, caller: AccountId, root: Digest) -> Result<EventRecord, BridgeError> {
        self.guarded("publish_root", |engine| {
            engine.ensure_operator(&caller, "publish_root")?;
            let previous = std::mem::replace(&mut engine.merkle_root, root);
            let now = engine.clock.now();
            let record = engine
                .events
                .emit(now, BridgeEvent::RootUpdated(RootUpdated { previous, root }));
            info!(previous = %previous, root = %root, "Merkle root published");
            Ok(record)
        })
    }

    /// Stop deposits and withdrawals.
    pub fn pause(&mut self, caller: AccountId) -> Result<EventRecord, BridgeError> {
        self.guarded("pause", |engine| {
            engine.ensure_operator(&caller, "pause")?;
            if !engine.pause_guard.pause() {
                return Err(BridgeError::Paused);
            }
            let now = engine.clock.now();
            warn!(operator = %caller, "Engine paused");
            Ok(engine.events.emit(now, BridgeEvent::Paused { by: caller }))
        })
    }

    /// Resume deposits and withdrawals.
    pub fn unpause(&mut self, caller: AccountId) -> Result<EventRecord, BridgeError> {
        self.guarded("unpause", |engine| {
            engine.ensure_operator(&caller, "unpause")?;
            if !engine.pause_guard.unpause() {
                return Err(BridgeError::NotPaused);
            }
            let now = engine.clock.now();
            info!(operator = %caller, "Engine unpaused");
            Ok(engine.events.emit(now, BridgeEvent::Unpaused { by: caller }))
        })
    }

    /// Cancel a pending large withdrawal on the operator's fraud assertion.
    ///
    /// The amount was never debited, so it simply stays in the owner's
    /// balance. The id remains processed and cannot be re-initiated.
    pub fn submit_fraud_override(
        &mut self,
        caller: AccountId,
        id: WithdrawalId,
    ) -> Result<EventRecord, BridgeError> {
        self.guarded("submit_fraud_override", |engine| {
            engine.ensure_operator(&caller, "submit_fraud_override")?;
            let pending = engine.commitments.clear_challenge_start(&id)?;
            engine.commitments.mark_cancelled(id);

            let now = engine.clock.now();
            warn!(
                owner = %pending.owner,
                amount = %pending.amount,
                id = %id.short(),
                "Pending withdrawal cancelled by fraud override"
            );
            Ok(engine.events.emit(
                now,
                BridgeEvent::FraudOverrideSubmitted(FraudOverrideSubmitted {
                    id,
                    owner: pending.owner,
                    amount: pending.amount,
                }),
            ))
        })
    }

    // ───────────────────────── Views ─────────────────────────

    /// `(balance, nonce counter)` for `owner`.
    pub fn user_info(&self, owner: &AccountId) -> (Amount, u64) {
        let account = self.ledger.account(owner);
        (account.balance, account.nonce)
    }

    pub fn account(&self, owner: &AccountId) -> AccountState {
        self.ledger.account(owner)
    }

    /// Nonce the owner's next withdrawal must claim.
    pub fn authorization_nonce(&self, owner: &AccountId) -> u64 {
        self.ledger.account(owner).authorization_nonce()
    }

    /// Funds held by the engine.
    pub fn contract_balance(&self) -> Amount {
        self.custody
    }

    /// Sum of all owner balances.
    pub fn total_liabilities(&self) -> Amount {
        self.ledger.total_balance()
    }

    pub fn is_processed(&self, id: &WithdrawalId) -> bool {
        self.commitments.is_processed(id)
    }

    pub fn withdrawal_status(&self, id: &WithdrawalId) -> WithdrawalStatus {
        self.commitments.status(id)
    }

    pub fn pending_withdrawal(&self, id: &WithdrawalId) -> Option<&PendingWithdrawal> {
        self.commitments.pending(id)
    }

    pub fn pending_withdrawals(&self, owner: &AccountId) -> Vec<&PendingWithdrawal> {
        self.commitments.pending_for(owner)
    }

    /// Earliest completion time of a pending withdrawal.
    pub fn challenge_deadline(&self, id: &WithdrawalId) -> Option<i64> {
        self.commitments
            .challenge_start(id)
            .map(|started| started.saturating_add(self.config.challenge_period_secs))
    }

    /// Id this engine derives for (owner, amount, nonce).
    pub fn withdrawal_id(&self, owner: &AccountId, amount: Amount, nonce: u64) -> WithdrawalId {
        derive_id(owner, amount, nonce, self.config.chain_id)
    }

    pub fn merkle_root(&self) -> Digest {
        self.merkle_root
    }

    pub fn is_paused(&self) -> bool {
        self.pause_guard.is_paused()
    }

    pub fn operator(&self) -> AccountId {
        self.operator.holder()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Take all buffered records. Closed while an operation is in flight, so
    /// a payout receiver cannot consume events that may still be rolled back.
    pub fn drain_events(&mut self) -> Result<Vec<EventRecord>, BridgeError> {
        self.guarded("drain_events", |engine| Ok(engine.events.drain()))
    }

    // ───────────────────────── Internal ─────────────────────────

    /// Run `op` holding the reentrancy guard.
    fn guarded<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        if !self.reentrancy_guard.enter() {
            warn!(operation, "Reentrant call rejected");
            return Err(BridgeError::Reentrancy);
        }
        let result = op(self);
        self.reentrancy_guard.exit();

        if let Err(err) = &result {
            debug!(operation, error = %err, "Operation rejected");
        }
        result
    }

    /// Run `effects`, restoring everything it may touch if it fails.
    fn atomically<T>(
        &mut self,
        owner: AccountId,
        ids: &[WithdrawalId],
        effects: impl FnOnce(&mut Self) -> Result<T, BridgeError>,
    ) -> Result<T, BridgeError> {
        let checkpoint = Checkpoint {
            owner,
            account: self.ledger.account(&owner),
            records: ids
                .iter()
                .map(|id| (*id, self.commitments.snapshot(id)))
                .collect(),
            custody: self.custody,
            sequence: self.events.last_sequence(),
        };

        let result = effects(self);
        if result.is_err() {
            self.rollback(checkpoint);
        }
        result
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        self.ledger.restore(checkpoint.owner, checkpoint.account);
        for (id, snapshot) in checkpoint.records {
            self.commitments.restore(id, snapshot);
        }
        self.custody = checkpoint.custody;
        self.events.rewind(checkpoint.sequence);
        warn!(owner = %checkpoint.owner, "Operation rolled back");
    }

    /// Replay, nonce and proof checks for one withdrawal claim.
    fn authorize(
        &self,
        owner: &AccountId,
        amount: Amount,
        nonce: u64,
        expected_nonce: u64,
        proof: &[Digest],
    ) -> Result<WithdrawalId, BridgeError> {
        let id = derive_id(owner, amount, nonce, self.config.chain_id);
        if self.commitments.is_processed(&id) {
            warn!(owner = %owner, id = %id.short(), "Replay rejected");
            return Err(BridgeError::AlreadyProcessed { id });
        }
        if nonce != expected_nonce {
            warn!(owner = %owner, expected = expected_nonce, got = nonce, "Nonce mismatch");
            return Err(BridgeError::InvalidNonce {
                expected: expected_nonce,
                got: nonce,
            });
        }
        let leaf = merkle::leaf_hash(owner, amount, nonce);
        if !merkle::verify(proof, &self.merkle_root, &leaf) {
            warn!(owner = %owner, id = %id.short(), "Merkle proof rejected");
            return Err(BridgeError::InvalidProof);
        }
        Ok(id)
    }

    /// Debit, release custody, transfer, then record completions.
    fn settle(
        &mut self,
        owner: AccountId,
        total: Amount,
        completions: &[(WithdrawalId, Amount)],
        now: i64,
        transfer: &mut dyn FundsTransfer,
    ) -> Result<(), BridgeError> {
        self.ledger.debit(&owner, total)?;
        self.custody = self
            .custody
            .checked_sub(total)
            .ok_or(BridgeError::Overflow)?;

        if !transfer.transfer(self, owner, total) {
            warn!(owner = %owner, amount = %total, "Funds transfer failed");
            return Err(BridgeError::TransferFailed);
        }

        for (id, amount) in completions {
            self.events.emit(
                now,
                BridgeEvent::WithdrawalCompleted(WithdrawalCompleted {
                    id: *id,
                    owner,
                    amount: *amount,
                }),
            );
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), BridgeError> {
        if self.pause_guard.is_paused() {
            return Err(BridgeError::Paused);
        }
        Ok(())
    }

    fn ensure_operator(&self, caller: &AccountId, operation: &'static str) -> Result<(), BridgeError> {
        if !self.operator.authorizes(caller) {
            warn!(caller = %caller, operation, "Unauthorized operator call");
            return Err(BridgeError::Unauthorized);
        }
        Ok(())
    }
}

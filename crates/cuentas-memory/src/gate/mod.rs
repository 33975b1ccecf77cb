//! Confirmation gate. Holds at most one deferred operation per user.
//!
//! Large writes are not executed straight away: the gate stores them and the
//! user has a fixed window to answer yes or no. Expiry is lazy: records are
//! checked against the clock on access, and [`ConfirmationGate::cleanup_expired`]
//! exists only to reclaim memory.

mod pending;
mod vocabulary;


pub use pending::{BatchItem, NotPending, Pending, PendingAction, PendingBatchAction};
pub use vocabulary::{classify_confirmation_text, ConfirmationReply};

use chrono::Duration;
use cuentas_core::{
    clock::Clock,
    intent::{ActionKind, ClassifiedIntent},
    limits::{CONFIRMATION_THRESHOLD, CONFIRMATION_WINDOW_SECS},
};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-user single-slot store of pending actions.
///
/// Single and batch records share one map, so a user can never hold both.
/// Every mutation is one per-key map operation: concurrent creates for the
/// same user resolve to last-writer-wins without locking other users.
pub struct ConfirmationGate {
    slots: DashMap<String, Pending>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl ConfirmationGate {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: DashMap::new(),
            window: Duration::seconds(CONFIRMATION_WINDOW_SECS),
            clock,
        }
    }

    /// Whether an amount is large enough to need explicit confirmation.
    pub fn requires_confirmation(amount: Option<f64>) -> bool {
        amount.is_some_and(|a| a > CONFIRMATION_THRESHOLD)
    }

    /// Defer a single transaction, replacing whatever the user had pending.
    pub fn create_pending_single(
        &self,
        action_kind: ActionKind,
        intent: ClassifiedIntent,
        user_id: &str,
        user_key: &str,
    ) -> PendingAction {
        let now = self.clock.now();
        let action = PendingAction {
            action_kind,
            intent,
            user_id: user_id.to_string(),
            user_key: user_key.to_string(),
            created_at: now,
            expires_at: now + self.window,
        };
        self.store(user_key, Pending::Single(action.clone()));
        action
    }

    /// Defer every operation of a message as one unit, replacing whatever the
    /// user had pending.
    pub fn create_pending_batch(
        &self,
        intents: Vec<ClassifiedIntent>,
        user_id: &str,
        user_key: &str,
    ) -> PendingBatchAction {
        let now = self.clock.now();
        let batch = PendingBatchAction {
            items: intents.into_iter().map(BatchItem::from).collect(),
            user_id: user_id.to_string(),
            user_key: user_key.to_string(),
            created_at: now,
            expires_at: now + self.window,
        };
        self.store(user_key, Pending::Batch(batch.clone()));
        batch
    }

    fn store(&self, user_key: &str, record: Pending) {
        let label = record.label();
        if let Some(previous) = self.slots.insert(user_key.to_string(), record) {
            debug!("gate: {user_key} replaced pending {}", previous.label());
        }
        info!("gate: {user_key} now awaiting confirmation ({label})");
    }

    /// The live pending record for `user_key`, if any.
    ///
    /// An expired record found here is discarded.
    pub fn peek(&self, user_key: &str) -> Option<Pending> {
        let now = self.clock.now();
        if self
            .slots
            .remove_if(user_key, |_, p| p.is_expired(now))
            .is_some()
        {
            debug!("gate: discarded expired record for {user_key}");
        }
        self.slots.get(user_key).map(|p| p.value().clone())
    }

    /// Whether any record, live or lapsed, is stored for `user_key`.
    pub fn holds(&self, user_key: &str) -> bool {
        self.slots.contains_key(user_key)
    }

    /// Take the pending record out of the gate for execution.
    ///
    /// The slot is empty afterwards in every case.
    pub fn confirm(&self, user_key: &str) -> Result<Pending, NotPending> {
        let now = self.clock.now();
        match self.slots.remove(user_key) {
            Some((_, record)) if record.is_expired(now) => {
                info!("gate: {user_key} confirmed too late ({})", record.label());
                Err(NotPending::Expired)
            }
            Some((_, record)) => {
                info!("gate: {user_key} confirmed {}", record.label());
                Ok(record)
            }
            None => Err(NotPending::Absent),
        }
    }

    /// Drop whatever the user had pending. Returns whether anything was removed.
    pub fn cancel(&self, user_key: &str) -> bool {
        let removed = self.slots.remove(user_key).is_some();
        if removed {
            info!("gate: {user_key} cancelled pending action");
        }
        removed
    }

    /// Cancel on the user's behalf, telling a live record from a lapsed one.
    ///
    /// The slot is empty afterwards in every case.
    pub fn withdraw(&self, user_key: &str) -> Result<(), NotPending> {
        let now = self.clock.now();
        match self.slots.remove(user_key) {
            Some((_, record)) if record.is_expired(now) => {
                info!("gate: {user_key} cancelled too late ({})", record.label());
                Err(NotPending::Expired)
            }
            Some((_, record)) => {
                info!("gate: {user_key} cancelled {}", record.label());
                Ok(())
            }
            None => Err(NotPending::Absent),
        }
    }

    /// Number of outstanding (non-expired) confirmations, single and batch.
    pub fn pending_count(&self) -> usize {
        let now = self.clock.now();
        self.slots
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    /// Remove every expired record. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.slots.len();
        self.slots.retain(|_, p| !p.is_expired(now));
        before.saturating_sub(self.slots.len())
    }
}

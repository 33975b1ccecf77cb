//! Deferred operations waiting for a yes/no from the user.

use chrono::{DateTime, Utc};
use cuentas_core::intent::{ActionKind, ClassifiedIntent, IntentKind, TransactionType};

/// A single transaction awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAction {
    pub action_kind: ActionKind,
    pub intent: ClassifiedIntent,
    /// Backend user id the action will be executed for.
    pub user_id: String,
    /// Channel user key the record is stored under.
    pub user_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// One line of a deferred batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub kind: IntentKind,
    pub intent: ClassifiedIntent,
}

impl From<ClassifiedIntent> for BatchItem {
    fn from(intent: ClassifiedIntent) -> Self {
        Self {
            kind: intent.kind,
            intent,
        }
    }
}

/// Every operation extracted from one message, deferred together.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBatchAction {
    pub items: Vec<BatchItem>,
    pub user_id: String,
    pub user_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PendingBatchAction {
    /// Sum of the amounts of the transaction-creating items of type `ty`.
    pub fn subtotal(&self, ty: TransactionType) -> f64 {
        self.items
            .iter()
            .filter(|item| item.kind.creates_transaction())
            .filter(|item| item.intent.effective_type() == Some(ty))
            .filter_map(|item| item.intent.amount)
            .sum()
    }
}

/// The single outstanding record a user can have.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    Single(PendingAction),
    Batch(PendingBatchAction),
}

impl Pending {
    pub fn expires_at(&self) -> DateTime<Utc> {
        match self {
            Self::Single(p) => p.expires_at,
            Self::Batch(b) => b.expires_at,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Single(p) => &p.user_id,
            Self::Batch(b) => &b.user_id,
        }
    }

    /// Whether the confirmation window has lapsed at `now`. Pure.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::Single(p) => format!("single {:?}", p.action_kind),
            Self::Batch(b) => format!("batch of {}", b.items.len()),
        }
    }
}

/// Why `confirm` had nothing to hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotPending {
    /// No record exists for the user.
    Absent,
    /// A record existed but its window had lapsed; it has been discarded.
    Expired,
}

//! Message processor: the single entry point from a channel into the
//! conversational core.
//!
//! Each turn runs under a per-user lock, so one user's messages are handled
//! in arrival order while different users proceed in parallel.

mod confirm;
mod dispatch;
mod humanize;
mod pipeline;

#[cfg(test)]
mod tests;

use cuentas_core::{
    clock::Clock,
    config::Config,
    traits::{FinancialBackend, Humanizer, IntentClassifier},
};
use cuentas_memory::{AuditLogger, ConfirmationGate, ConversationWindow};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Routes inbound text through confirmation handling, classification,
/// dispatch and formatting, and always produces a reply.
pub struct Processor {
    pub(super) classifier: Arc<dyn IntentClassifier>,
    pub(super) backend: Arc<dyn FinancialBackend>,
    pub(super) humanizer: Option<Arc<dyn Humanizer>>,
    pub(super) window: ConversationWindow,
    pub(super) gate: ConfirmationGate,
    pub(super) audit: Option<AuditLogger>,
    pub(super) config: Config,
    pub(super) clock: Arc<dyn Clock>,
    /// One lock per user key, held for the whole turn.
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Processor {
    pub fn new(
        config: Config,
        classifier: Arc<dyn IntentClassifier>,
        backend: Arc<dyn FinancialBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            classifier,
            backend,
            humanizer: None,
            window: ConversationWindow::new(clock.clone()),
            gate: ConfirmationGate::new(clock.clone()),
            audit: None,
            config,
            clock,
            user_locks: DashMap::new(),
        }
    }

    /// Rewrite long read-only replies through `humanizer`.
    pub fn with_humanizer(mut self, humanizer: Arc<dyn Humanizer>) -> Self {
        self.humanizer = Some(humanizer);
        self
    }

    /// Record every turn in the audit log.
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Outstanding confirmations across all users (single + batch).
    pub fn pending_count(&self) -> usize {
        self.gate.pending_count()
    }

    /// Users with a conversation window in memory.
    pub fn active_conversations(&self) -> usize {
        self.window.user_count()
    }

    pub(super) fn user_lock(&self, user_key: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_key.to_string())
            .or_default()
            .clone()
    }

    /// Drop expired confirmations, idle windows, and unused user locks.
    pub fn sweep(&self) {
        let expired = self.gate.cleanup_expired();
        let idle = self.window.purge_idle();
        self.user_locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        if expired > 0 || idle > 0 {
            info!("sweep: dropped {expired} expired confirmation(s), {idle} idle window(s)");
        } else {
            debug!("sweep: nothing to drop");
        }
    }

    /// Start the periodic sweep. Returns `None` when disabled in config.
    ///
    /// The task holds only a weak reference and stops once the processor is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let secs = self.config.confirmation.sweep_interval_secs;
        if secs == 0 {
            return None;
        }
        let weak = Arc::downgrade(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            // First tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(processor) = weak.upgrade() else {
                    break;
                };
                processor.sweep();
            }
        }))
    }
}

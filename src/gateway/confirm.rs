//! Executing or dropping a user's pending confirmation.

use super::dispatch::DispatchOutcome;
use super::Processor;
use crate::format::{self, t};
use cuentas_memory::gate::{NotPending, Pending};
use std::sync::Arc;
use tracing::info;

impl Processor {
    /// Take the user's pending record and execute it.
    ///
    /// Single records make one backend call; batches run every stored item,
    /// best-effort. Nothing executes for an absent or lapsed record.
    pub(super) async fn confirm_pending(self: &Arc<Self>, user_key: &str) -> DispatchOutcome {
        match self.gate.confirm(user_key) {
            Ok(record) => {
                let kinds = pending_kinds(&record);
                let this = Arc::clone(self);
                self.guarded(user_key, &kinds, async move {
                    this.execute_confirmed(record).await
                })
                .await
            }
            Err(NotPending::Expired) => DispatchOutcome::completed(t("confirmation_expired")),
            Err(NotPending::Absent) => DispatchOutcome::completed(t("nothing_to_confirm")),
        }
    }

    /// Drop the user's pending record, if any.
    ///
    /// A lapsed record is reported as expired, not as cancelled.
    pub(super) fn cancel_pending(&self, user_key: &str) -> DispatchOutcome {
        match self.gate.withdraw(user_key) {
            Ok(()) => DispatchOutcome::completed(t("cancelled")),
            Err(NotPending::Expired) => DispatchOutcome::completed(t("confirmation_expired")),
            Err(NotPending::Absent) => DispatchOutcome::completed(t("nothing_to_cancel")),
        }
    }

    /// Describe the live pending record for `/pendiente`.
    pub(super) fn describe_pending(&self, user_key: &str) -> DispatchOutcome {
        let text = match self.gate.peek(user_key) {
            Some(Pending::Single(action)) => format::confirmation_single(&action),
            Some(Pending::Batch(batch)) => format::confirmation_batch(&batch),
            None => t("no_pending").to_string(),
        };
        DispatchOutcome::completed(text)
    }

    async fn execute_confirmed(&self, record: Pending) -> DispatchOutcome {
        match record {
            Pending::Single(action) => {
                info!(
                    "executing confirmed {:?} for {}",
                    action.action_kind, action.user_key
                );
                match self.handle(&action.user_id, &action.intent).await {
                    Ok(text) => DispatchOutcome::completed(text),
                    Err(text) => DispatchOutcome::failed(text),
                }
            }
            Pending::Batch(batch) => {
                info!(
                    "executing confirmed batch of {} for {}",
                    batch.items.len(),
                    batch.user_key
                );
                let intents = batch.items.into_iter().map(|item| item.intent).collect();
                self.run_batch(&batch.user_id, intents).await
            }
        }
    }
}

fn pending_kinds(record: &Pending) -> String {
    match record {
        Pending::Single(action) => action.action_kind.intent_kind().to_string(),
        Pending::Batch(batch) => batch
            .items
            .iter()
            .map(|item| item.kind.as_str())
            .collect::<Vec<_>>()
            .join(","),
    }
}

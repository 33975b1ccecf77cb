//! Per-turn flow: commands, confirmation replies, classification, dispatch.

use super::dispatch::{DispatchOutcome, Status};
use super::Processor;
use crate::commands::Command;
use crate::format::t;
use cuentas_core::{intent::ClassifiedIntent, message::Role};
use cuentas_memory::{
    audit::{AuditEntry, AuditStatus},
    classify_confirmation_text, ConfirmationReply,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

impl Processor {
    /// Process one inbound message and return the reply text.
    ///
    /// Never fails: collaborator errors and panics inside dispatch become a
    /// user-facing apology, with the technical detail logged.
    pub async fn process_message(self: &Arc<Self>, user_key: &str, text: &str) -> String {
        let lock = self.user_lock(user_key);
        let _turn = lock.lock().await;
        let started = Instant::now();

        info!("[{user_key}] says: {}", preview(text, 60));

        let (outcome, kinds) = self.run_turn(user_key, text).await;

        let elapsed_ms = started.elapsed().as_millis() as i64;
        info!(
            "[{user_key}] replied in {elapsed_ms}ms | intents: {kinds} | status: {:?}",
            outcome.status
        );
        self.audit_turn(user_key, text, &outcome, &kinds, elapsed_ms)
            .await;

        outcome.text
    }

    async fn run_turn(self: &Arc<Self>, user_key: &str, text: &str) -> (DispatchOutcome, String) {
        // --- 1. SLASH COMMANDS ---
        if let Some(command) = Command::parse(text) {
            let outcome = match command {
                Command::Help => DispatchOutcome::completed(t("help")),
                Command::Forget => {
                    self.window.clear(user_key);
                    DispatchOutcome::completed(t("conversation_cleared"))
                }
                Command::Pending => self.describe_pending(user_key),
                Command::Confirm => self.confirm_pending(user_key).await,
                Command::Cancel => self.cancel_pending(user_key),
            };
            return (outcome, format!("/{}", command.as_str()));
        }

        // --- 2. CONFIRMATION REPLY ---
        let reply = classify_confirmation_text(text);
        if reply != ConfirmationReply::Unclear && self.gate.holds(user_key) {
            self.window.append(user_key, Role::User, text);
            let (outcome, kinds) = match reply {
                ConfirmationReply::Confirm => (self.confirm_pending(user_key).await, "confirm"),
                _ => (self.cancel_pending(user_key), "cancel"),
            };
            self.window.append(user_key, Role::Assistant, &outcome.text);
            return (outcome, kinds.to_string());
        }

        // --- 3. CLASSIFY ---
        self.window.append(user_key, Role::User, text);
        let context = self.window.snapshot(user_key);
        let intents = match self.classifier.classify(text, &context).await {
            Ok(intents) if !intents.is_empty() => intents,
            Ok(_) => {
                warn!("classifier returned no intents for {user_key}");
                vec![ClassifiedIntent::question(t("didnt_understand"))]
            }
            Err(e) => {
                warn!("classification failed for {user_key}: {e}");
                vec![ClassifiedIntent::question(t("didnt_understand"))]
            }
        };
        let kinds = intents
            .iter()
            .map(|i| i.kind.as_str())
            .collect::<Vec<_>>()
            .join(",");

        // --- 4. DISPATCH ---
        let user_id = self.config.backend_user_id(user_key).to_string();
        let this = Arc::clone(self);
        let key = user_key.to_string();
        let dispatched = intents.clone();
        let outcome = self
            .guarded(user_key, &kinds, async move {
                this.dispatch(&user_id, &key, dispatched).await
            })
            .await;

        // --- 5. HUMANIZE ---
        let outcome = self.maybe_humanize(text, &intents, outcome).await;

        // --- 6. REMEMBER ---
        self.window.append(user_key, Role::Assistant, &outcome.text);
        (outcome, kinds)
    }

    /// Run `task` on its own tokio task so a panic inside it is contained.
    pub(super) async fn guarded<F>(&self, user_key: &str, kinds: &str, task: F) -> DispatchOutcome
    where
        F: Future<Output = DispatchOutcome> + Send + 'static,
    {
        match tokio::spawn(task).await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!("dispatch for {user_key} [{kinds}] failed unexpectedly: {join_err}");
                DispatchOutcome::failed(t("apology"))
            }
        }
    }

    async fn audit_turn(
        &self,
        user_key: &str,
        input: &str,
        outcome: &DispatchOutcome,
        kinds: &str,
        elapsed_ms: i64,
    ) {
        let Some(audit) = self.audit.as_ref() else {
            return;
        };
        let status = match outcome.status {
            Status::Completed => AuditStatus::Ok,
            Status::Deferred => AuditStatus::Deferred,
            Status::Failed => AuditStatus::Error,
        };
        let entry = AuditEntry {
            user_key: user_key.to_string(),
            input_text: input.to_string(),
            output_text: Some(outcome.text.clone()),
            intent_kinds: Some(kinds.to_string()),
            processing_ms: Some(elapsed_ms),
            status,
        };
        if let Err(e) = audit.log(&entry).await {
            warn!("audit write failed: {e}");
        }
    }
}

/// First `max` chars of `text`, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let truncated: String = text.chars().take(max).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

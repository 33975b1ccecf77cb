//! Intent dispatch: one handler per intent kind, plus the multi-intent
//! "defer all or run each" policy.

use super::Processor;
use crate::format::{self, t, BatchLine};
use cuentas_core::{
    error::CuentasError,
    finance::{NewRule, NewTransaction, TransactionFilter},
    intent::{ActionKind, ClassifiedIntent, IntentKind},
};
use cuentas_memory::ConfirmationGate;
use tracing::{info, warn};

/// Default page size for listings when the user didn't ask for one.
const DEFAULT_LIST_LIMIT: u32 = 10;

/// Category used when the classifier couldn't tell one.
const FALLBACK_CATEGORY: &str = "otros";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Completed,
    /// A confirmation prompt was issued; nothing executed yet.
    Deferred,
    Failed,
}

/// Reply text plus how the turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DispatchOutcome {
    pub text: String,
    pub status: Status,
}

impl DispatchOutcome {
    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: Status::Completed,
        }
    }

    pub fn deferred(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: Status::Deferred,
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: Status::Failed,
        }
    }
}

/// Handler result: reply text, or the user-facing failure text (already logged).
type HandlerResult = Result<String, &'static str>;

impl Processor {
    /// Dispatch everything the classifier extracted from one message.
    pub(super) async fn dispatch(
        &self,
        user_id: &str,
        user_key: &str,
        mut intents: Vec<ClassifiedIntent>,
    ) -> DispatchOutcome {
        if intents.len() == 1 {
            let intent = intents.remove(0);
            self.execute_one(user_id, user_key, intent).await
        } else {
            self.execute_many(user_id, user_key, intents).await
        }
    }

    /// Single intent: large writes are deferred, everything else runs now.
    pub(super) async fn execute_one(
        &self,
        user_id: &str,
        user_key: &str,
        intent: ClassifiedIntent,
    ) -> DispatchOutcome {
        if let Some(action) = ActionKind::from_intent(intent.kind) {
            if ConfirmationGate::requires_confirmation(intent.amount) {
                let pending = self
                    .gate
                    .create_pending_single(action, intent, user_id, user_key);
                return DispatchOutcome::deferred(format::confirmation_single(&pending));
            }
        }

        match self.handle(user_id, &intent).await {
            Ok(text) => DispatchOutcome::completed(text),
            Err(text) => DispatchOutcome::failed(text),
        }
    }

    /// Several intents: if any write needs confirmation the whole message is
    /// deferred as one batch; otherwise each runs in order, best-effort.
    pub(super) async fn execute_many(
        &self,
        user_id: &str,
        user_key: &str,
        intents: Vec<ClassifiedIntent>,
    ) -> DispatchOutcome {
        let needs_confirmation = intents.iter().any(|i| {
            i.kind.creates_transaction() && ConfirmationGate::requires_confirmation(i.amount)
        });
        if needs_confirmation {
            let pending = self.gate.create_pending_batch(intents, user_id, user_key);
            return DispatchOutcome::deferred(format::confirmation_batch(&pending));
        }
        self.run_batch(user_id, intents).await
    }

    /// Run every intent, collecting successes and failures. No confirmation check.
    pub(super) async fn run_batch(
        &self,
        user_id: &str,
        intents: Vec<ClassifiedIntent>,
    ) -> DispatchOutcome {
        let mut lines = Vec::with_capacity(intents.len());
        for intent in intents {
            let result = self.handle(user_id, &intent).await;
            let line = match result {
                Ok(text) => {
                    let detail = (!intent.kind.creates_transaction()).then_some(text);
                    BatchLine {
                        intent,
                        succeeded: true,
                        detail,
                    }
                }
                Err(_) => BatchLine {
                    intent,
                    succeeded: false,
                    detail: None,
                },
            };
            lines.push(line);
        }

        let succeeded = lines.iter().filter(|l| l.succeeded).count();
        info!(
            "batch for {user_id}: {succeeded}/{} operation(s) succeeded",
            lines.len()
        );
        let text = format::batch_result(&lines);
        if succeeded == 0 {
            DispatchOutcome::failed(text)
        } else {
            DispatchOutcome::completed(text)
        }
    }

    /// Execute one intent against the backend. Exhaustive over `IntentKind`.
    pub(super) async fn handle(&self, user_id: &str, intent: &ClassifiedIntent) -> HandlerResult {
        match intent.kind {
            IntentKind::CreateExpense | IntentKind::CreateIncome => {
                self.create_transaction(user_id, intent).await
            }
            IntentKind::ValidateExpense => self.validate_expense(user_id, intent).await,
            IntentKind::ListTransactions => {
                let filter = TransactionFilter {
                    transaction_type: intent.transaction_type,
                    category: intent.category.clone(),
                    limit: Some(intent.limit.unwrap_or(DEFAULT_LIST_LIMIT)),
                    ..Default::default()
                };
                self.list(user_id, intent, &filter, "Tus últimos movimientos")
                    .await
            }
            IntentKind::ListByDate => {
                let date = intent
                    .date
                    .unwrap_or_else(|| self.clock.now().date_naive());
                let filter = TransactionFilter {
                    transaction_type: intent.transaction_type,
                    category: intent.category.clone(),
                    from: Some(date),
                    to: Some(date),
                    limit: intent.limit,
                };
                let header = format!("Movimientos del {}", date.format("%d/%m/%Y"));
                self.list(user_id, intent, &filter, &header).await
            }
            IntentKind::ListByRange => {
                let filter = TransactionFilter {
                    transaction_type: intent.transaction_type,
                    category: intent.category.clone(),
                    from: intent.start_date,
                    to: intent.end_date,
                    limit: intent.limit,
                };
                let header = match (intent.start_date, intent.end_date) {
                    (Some(from), Some(to)) => format!(
                        "Movimientos del {} al {}",
                        from.format("%d/%m/%Y"),
                        to.format("%d/%m/%Y")
                    ),
                    _ => "Movimientos del periodo".to_string(),
                };
                self.list(user_id, intent, &filter, &header).await
            }
            IntentKind::Search => {
                let Some(query) = intent.search_text() else {
                    return Err(t("missing_search_query"));
                };
                let found = self
                    .backend
                    .search_transactions(user_id, query)
                    .await
                    .map_err(|e| backend_failed(intent.kind, user_id, e))?;
                Ok(format::transaction_list(
                    &format!("Resultados para \"{query}\""),
                    &found,
                ))
            }
            IntentKind::GetBalance => {
                let balance = self
                    .backend
                    .balance(user_id)
                    .await
                    .map_err(|e| backend_failed(intent.kind, user_id, e))?;
                Ok(format::balance(&balance))
            }
            IntentKind::GetSummary => {
                let period = intent.period.as_deref().unwrap_or("month");
                let summary = self
                    .backend
                    .summary(user_id, period)
                    .await
                    .map_err(|e| backend_failed(intent.kind, user_id, e))?;
                Ok(format::summary(&summary))
            }
            IntentKind::CreateRule => {
                let rule = NewRule {
                    category: intent.category.clone(),
                    amount: intent.amount,
                    transaction_type: intent.transaction_type,
                    frequency: intent.frequency.clone(),
                    description: intent.description.clone(),
                };
                let created = self
                    .backend
                    .create_rule(user_id, &rule)
                    .await
                    .map_err(|e| backend_failed(intent.kind, user_id, e))?;
                Ok(format::rule_created(&created))
            }
            IntentKind::ListRules => {
                let rules = self
                    .backend
                    .list_rules(user_id)
                    .await
                    .map_err(|e| backend_failed(intent.kind, user_id, e))?;
                Ok(format::rule_list(&rules))
            }
            IntentKind::DeleteTransaction => self.delete_transaction(user_id, intent).await,
            IntentKind::Question | IntentKind::Unknown => Ok(intent
                .response
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or(t("didnt_understand"))
                .to_string()),
        }
    }

    async fn create_transaction(&self, user_id: &str, intent: &ClassifiedIntent) -> HandlerResult {
        let (Some(action), Some(amount)) = (
            ActionKind::from_intent(intent.kind),
            intent.amount.filter(|a| *a > 0.0),
        ) else {
            return Err(t("missing_amount"));
        };
        let tx = NewTransaction {
            amount,
            transaction_type: action.transaction_type(),
            category: intent
                .category
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            description: intent.description.clone(),
            date: intent.date,
        };
        let created = self
            .backend
            .create_transaction(user_id, &tx)
            .await
            .map_err(|e| backend_failed(intent.kind, user_id, e))?;
        info!(
            "created {} of {} for {user_id} (id {})",
            created.transaction_type.as_str(),
            created.amount,
            created.id
        );
        Ok(format::transaction_created(&created))
    }

    /// Read-only affordability check; never writes, whatever the amount.
    async fn validate_expense(&self, user_id: &str, intent: &ClassifiedIntent) -> HandlerResult {
        let Some(amount) = intent.amount.filter(|a| *a > 0.0) else {
            return Err(t("missing_amount"));
        };
        let balance = self
            .backend
            .balance(user_id)
            .await
            .map_err(|e| backend_failed(intent.kind, user_id, e))?;
        Ok(format::affordability(amount, &balance))
    }

    async fn list(
        &self,
        user_id: &str,
        intent: &ClassifiedIntent,
        filter: &TransactionFilter,
        header: &str,
    ) -> HandlerResult {
        let txs = self
            .backend
            .list_transactions(user_id, filter)
            .await
            .map_err(|e| backend_failed(intent.kind, user_id, e))?;
        Ok(format::transaction_list(header, &txs))
    }

    /// Delete by id, or by description when exactly one transaction matches.
    async fn delete_transaction(&self, user_id: &str, intent: &ClassifiedIntent) -> HandlerResult {
        if let Some(id) = intent.transaction_id.as_deref().filter(|id| !id.is_empty()) {
            self.backend
                .delete_transaction(user_id, id)
                .await
                .map_err(|e| backend_failed(intent.kind, user_id, e))?;
            return Ok(format::transaction_deleted(None));
        }

        let Some(query) = intent.search_text() else {
            return Err(t("missing_delete_target"));
        };
        let mut matches = self
            .backend
            .search_transactions(user_id, query)
            .await
            .map_err(|e| backend_failed(intent.kind, user_id, e))?;

        match matches.len() {
            0 => Ok(format::delete_no_match(query)),
            1 => {
                let target = matches.remove(0);
                self.backend
                    .delete_transaction(user_id, &target.id)
                    .await
                    .map_err(|e| backend_failed(intent.kind, user_id, e))?;
                info!("deleted transaction {} for {user_id}", target.id);
                Ok(format::transaction_deleted(Some(&target)))
            }
            _ => Ok(format::delete_ambiguous(query, &matches)),
        }
    }
}

/// Log a backend failure and pick the user-facing text for it.
fn backend_failed(kind: IntentKind, user_id: &str, err: CuentasError) -> &'static str {
    warn!("backend call for {kind} failed (user {user_id}): {err}");
    format::backend_failure(kind)
}

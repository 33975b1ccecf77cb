use crate::{
    error::CuentasError,
    finance::{Balance, NewRule, NewTransaction, Rule, Summary, Transaction, TransactionFilter},
    intent::{ClassifiedIntent, IntentKind},
    message::ConversationEntry,
};
use async_trait::async_trait;

/// Intent classifier: turns free text into structured operations.
///
/// Internals (LLM, rules, ...) are opaque to the pipeline.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Human-readable classifier name.
    fn name(&self) -> &str;

    /// Classify `text` into one or more intents, in the order they appear.
    ///
    /// `context` is the user's conversation window, oldest first; its last
    /// entry is the message being classified.
    async fn classify(
        &self,
        text: &str,
        context: &[ConversationEntry],
    ) -> Result<Vec<ClassifiedIntent>, CuentasError>;
}

/// Financial backend: owns balances, transactions, and rules.
///
/// Every call is keyed by an opaque backend user id.
#[async_trait]
pub trait FinancialBackend: Send + Sync {
    async fn create_transaction(
        &self,
        user_id: &str,
        tx: &NewTransaction,
    ) -> Result<Transaction, CuentasError>;

    async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CuentasError>;

    async fn search_transactions(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<Transaction>, CuentasError>;

    async fn delete_transaction(&self, user_id: &str, id: &str) -> Result<(), CuentasError>;

    async fn balance(&self, user_id: &str) -> Result<Balance, CuentasError>;

    async fn summary(&self, user_id: &str, period: &str) -> Result<Summary, CuentasError>;

    async fn create_rule(&self, user_id: &str, rule: &NewRule) -> Result<Rule, CuentasError>;

    async fn list_rules(&self, user_id: &str) -> Result<Vec<Rule>, CuentasError>;

    /// Check if the backend is reachable.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Optional rewriter that turns report-style replies into friendlier prose.
#[async_trait]
pub trait Humanizer: Send + Sync {
    async fn humanize(
        &self,
        raw_reply: &str,
        original_query: &str,
        kind: IntentKind,
    ) -> Result<String, CuentasError>;
}

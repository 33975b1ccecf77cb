//! Structured intents produced by the classifier, one per financial operation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a classified intent asks for.
///
/// Closed set: the dispatcher matches on it exhaustively. Kinds the classifier
/// invents that are not listed here deserialize as [`IntentKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// "Can I afford X?" Read-only, never writes.
    ValidateExpense,
    CreateExpense,
    CreateIncome,
    ListTransactions,
    ListByDate,
    ListByRange,
    Search,
    GetBalance,
    GetSummary,
    CreateRule,
    ListRules,
    DeleteTransaction,
    Question,
    #[default]
    #[serde(other)]
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidateExpense => "validate_expense",
            Self::CreateExpense => "create_expense",
            Self::CreateIncome => "create_income",
            Self::ListTransactions => "list_transactions",
            Self::ListByDate => "list_by_date",
            Self::ListByRange => "list_by_range",
            Self::Search => "search",
            Self::GetBalance => "get_balance",
            Self::GetSummary => "get_summary",
            Self::CreateRule => "create_rule",
            Self::ListRules => "list_rules",
            Self::DeleteTransaction => "delete_transaction",
            Self::Question => "question",
            Self::Unknown => "unknown",
        }
    }

    /// Kinds that write a transaction and therefore go through the confirmation gate.
    pub fn creates_transaction(&self) -> bool {
        matches!(self, Self::CreateExpense | Self::CreateIncome)
    }

    /// Kinds whose replies are reports (balances, summaries, listings).
    pub fn is_read_heavy(&self) -> bool {
        matches!(
            self,
            Self::GetBalance
                | Self::GetSummary
                | Self::ListTransactions
                | Self::ListByDate
                | Self::ListByRange
        )
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of money flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

/// The subset of intents that can be deferred as a single pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    CreateExpense,
    CreateIncome,
}

impl ActionKind {
    /// Map an intent kind to its deferrable action, if it has one.
    pub fn from_intent(kind: IntentKind) -> Option<Self> {
        match kind {
            IntentKind::CreateExpense => Some(Self::CreateExpense),
            IntentKind::CreateIncome => Some(Self::CreateIncome),
            _ => None,
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Self::CreateExpense => TransactionType::Expense,
            Self::CreateIncome => TransactionType::Income,
        }
    }

    pub fn intent_kind(&self) -> IntentKind {
        match self {
            Self::CreateExpense => IntentKind::CreateExpense,
            Self::CreateIncome => IntentKind::CreateIncome,
        }
    }
}

/// One parsed operation extracted from a user message.
///
/// Built fresh per message by the classifier and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    pub kind: IntentKind,
    /// Non-negative amount in currency units.
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Reporting period ("month", "week", "year", ...).
    #[serde(default)]
    pub period: Option<String>,
    /// Rule recurrence ("monthly", "weekly", ...).
    #[serde(default)]
    pub frequency: Option<String>,
    /// Single day for `list_by_date`.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Free-text search term.
    #[serde(default)]
    pub query: Option<String>,
    /// Backend id for `delete_transaction`.
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    /// Canned answer, used only for `question`.
    #[serde(default)]
    pub response: Option<String>,
}

impl ClassifiedIntent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// A `question` intent carrying a ready-made answer.
    pub fn question(response: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Question,
            response: Some(response.into()),
            ..Default::default()
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Free-text search term: the explicit query, else the description.
    pub fn search_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .or(self.description.as_deref())
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// Transaction type implied by the kind, falling back to the explicit `type` field.
    pub fn effective_type(&self) -> Option<TransactionType> {
        match self.kind {
            IntentKind::CreateExpense => Some(TransactionType::Expense),
            IntentKind::CreateIncome => Some(TransactionType::Income),
            _ => self.transaction_type,
        }
    }
}

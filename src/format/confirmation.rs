//! Confirmation prompts and multi-operation result summaries.

use super::{describe_intent, money, t};
use cuentas_core::intent::{ClassifiedIntent, TransactionType};
use cuentas_memory::gate::{PendingAction, PendingBatchAction};

/// Prompt for a single large transaction awaiting confirmation.
pub fn confirmation_single(pending: &PendingAction) -> String {
    let intent = &pending.intent;
    let verb = match pending.action_kind.transaction_type() {
        TransactionType::Expense => "un gasto",
        TransactionType::Income => "un ingreso",
    };
    let mut lines = vec![format!(
        "⚠️ Vas a registrar {verb} de {}",
        intent.amount.map(money).unwrap_or_else(|| "?".to_string())
    )];
    lines.push(format!(
        "- Categoría: {}",
        intent.category.as_deref().unwrap_or("sin categoría")
    ));
    if let Some(desc) = intent.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("- Descripción: {desc}"));
    }
    lines.push(String::new());
    lines.push(t("confirm_instructions").to_string());
    lines.push(t("expiry_notice").to_string());
    lines.join("\n")
}

/// Prompt for a deferred batch: numbered items plus per-type totals.
pub fn confirmation_batch(pending: &PendingBatchAction) -> String {
    let mut lines = vec![format!(
        "⚠️ Vas a realizar {} operaciones:",
        pending.items.len()
    )];
    for (i, item) in pending.items.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, describe_intent(&item.intent)));
    }
    lines.push(String::new());
    let expenses = pending.subtotal(TransactionType::Expense);
    let income = pending.subtotal(TransactionType::Income);
    if expenses > 0.0 {
        lines.push(format!("Total gastos: {}", money(expenses)));
    }
    if income > 0.0 {
        lines.push(format!("Total ingresos: {}", money(income)));
    }
    lines.push(String::new());
    lines.push(t("confirm_instructions").to_string());
    lines.push(t("expiry_notice").to_string());
    lines.join("\n")
}

/// Outcome of one operation inside a multi-operation message.
#[derive(Debug, Clone)]
pub struct BatchLine {
    pub intent: ClassifiedIntent,
    pub succeeded: bool,
    /// Reply of the operation when it produced one worth showing.
    pub detail: Option<String>,
}

/// Combined reply for a multi-operation message: one line per operation in
/// order, failures marked inline, then a tally.
pub fn batch_result(lines: &[BatchLine]) -> String {
    let mut out = Vec::with_capacity(lines.len() + 2);
    for (i, line) in lines.iter().enumerate() {
        let mark = if line.succeeded { "✅" } else { "❌" };
        let mut entry = format!("{}. {mark} {}", i + 1, describe_intent(&line.intent));
        if !line.succeeded {
            entry.push_str(" (no se pudo completar)");
        }
        out.push(entry);
        if let Some(detail) = line.detail.as_deref().filter(|d| !d.is_empty()) {
            for detail_line in detail.lines() {
                out.push(format!("   {detail_line}"));
            }
        }
    }
    let ok = lines.iter().filter(|l| l.succeeded).count();
    out.push(String::new());
    out.push(format!(
        "{ok} de {} operaciones completadas.",
        lines.len()
    ));
    out.join("\n")
}

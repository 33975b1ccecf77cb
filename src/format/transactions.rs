//! Replies for transaction writes and listings.

use super::{money, t, type_label};
use cuentas_core::finance::Transaction;
use cuentas_core::intent::TransactionType;

/// Confirmation that a transaction was written.
pub fn transaction_created(tx: &Transaction) -> String {
    let icon = match tx.transaction_type {
        TransactionType::Expense => "💸",
        TransactionType::Income => "💰",
    };
    let mut text = format!(
        "{icon} {} registrado: {} en {}",
        type_label(tx.transaction_type),
        money(tx.amount),
        tx.category
    );
    if let Some(desc) = tx.description.as_deref().filter(|d| !d.is_empty()) {
        text.push_str(&format!(" ({desc})"));
    }
    text
}

/// One listing line: `- 12/03 Gasto $50,000 comida (almuerzo)`.
pub fn transaction_line(tx: &Transaction) -> String {
    let date = tx
        .date
        .map(|d| format!("{} ", d.format("%d/%m")))
        .unwrap_or_default();
    let mut line = format!(
        "- {date}{} {} {}",
        type_label(tx.transaction_type),
        money(tx.amount),
        tx.category
    );
    if let Some(desc) = tx.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!(" ({desc})"));
    }
    line
}

/// A headed listing, or the "nothing found" line when empty.
pub fn transaction_list(header: &str, txs: &[Transaction]) -> String {
    if txs.is_empty() {
        return t("no_transactions").to_string();
    }
    let mut lines = Vec::with_capacity(txs.len() + 1);
    lines.push(format!("{header}:"));
    lines.extend(txs.iter().map(transaction_line));
    lines.join("\n")
}

/// Confirmation that a transaction was deleted.
pub fn transaction_deleted(tx: Option<&Transaction>) -> String {
    match tx {
        Some(tx) => format!(
            "🗑️ Eliminé el movimiento: {} {} en {}",
            type_label(tx.transaction_type).to_lowercase(),
            money(tx.amount),
            tx.category
        ),
        None => "🗑️ Movimiento eliminado.".to_string(),
    }
}

/// Delete-by-description found nothing.
pub fn delete_no_match(query: &str) -> String {
    format!("No encontré ningún movimiento que coincida con \"{query}\".")
}

/// Delete-by-description matched several transactions; ask which one.
pub fn delete_ambiguous(query: &str, matches: &[Transaction]) -> String {
    let mut lines = vec![format!(
        "Encontré {} movimientos que coinciden con \"{query}\". ¿Cuál quieres eliminar?",
        matches.len()
    )];
    lines.extend(
        matches
            .iter()
            .map(|tx| format!("{} [ref {}]", transaction_line(tx), tx.id)),
    );
    lines.join("\n")
}

//! Reply formatting for every user-facing string the pipeline produces.
//!
//! Static strings come from `t(key)`; everything interpolated has its own
//! helper. Nothing here touches state or I/O.

mod confirmation;
mod labels;
mod reports;
mod transactions;


pub use confirmation::*;
pub use reports::*;
pub use transactions::*;

use cuentas_core::intent::{ClassifiedIntent, IntentKind, TransactionType};

/// Return a static reply string for `key`.
pub fn t(key: &str) -> &'static str {
    labels::lookup(key).unwrap_or("???")
}

/// Format an amount as `$50,000`, or `$1,234.50` when it has cents.
pub fn money(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let units = cents / 100;
    let frac = cents % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if frac == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{frac:02}")
    }
}

pub(crate) fn type_label(ty: TransactionType) -> &'static str {
    match ty {
        TransactionType::Expense => "Gasto",
        TransactionType::Income => "Ingreso",
    }
}

/// One-line description of what an intent will do, used in batch listings.
pub fn describe_intent(intent: &ClassifiedIntent) -> String {
    let amount = intent.amount.map(money).unwrap_or_else(|| "?".to_string());
    let category = intent.category.as_deref().unwrap_or("sin categoría");
    match intent.kind {
        IntentKind::CreateExpense | IntentKind::CreateIncome => {
            let label = match intent.effective_type() {
                Some(ty) => type_label(ty),
                None => "Movimiento",
            };
            let mut line = format!("{label} de {amount} en {category}");
            if let Some(desc) = intent.description.as_deref().filter(|d| !d.is_empty()) {
                line.push_str(&format!(" ({desc})"));
            }
            line
        }
        IntentKind::ValidateExpense => format!("Verificar si alcanza para {amount}"),
        IntentKind::ListTransactions => "Ver últimos movimientos".to_string(),
        IntentKind::ListByDate => match intent.date {
            Some(d) => format!("Ver movimientos del {}", d.format("%d/%m/%Y")),
            None => "Ver movimientos del día".to_string(),
        },
        IntentKind::ListByRange => "Ver movimientos del periodo".to_string(),
        IntentKind::Search => match intent.search_text() {
            Some(query) => format!("Buscar \"{query}\""),
            None => "Buscar movimientos".to_string(),
        },
        IntentKind::GetBalance => "Consultar saldo".to_string(),
        IntentKind::GetSummary => format!(
            "Resumen {}",
            period_label(intent.period.as_deref().unwrap_or("month"))
        ),
        IntentKind::CreateRule => format!("Crear regla para {category}"),
        IntentKind::ListRules => "Ver reglas".to_string(),
        IntentKind::DeleteTransaction => "Eliminar movimiento".to_string(),
        IntentKind::Question | IntentKind::Unknown => "Responder pregunta".to_string(),
    }
}

/// Spanish label for a reporting period key.
pub fn period_label(period: &str) -> String {
    match period {
        "day" | "today" => "de hoy".to_string(),
        "week" => "de la semana".to_string(),
        "month" => "del mes".to_string(),
        "year" => "del año".to_string(),
        other => format!("({other})"),
    }
}

/// User-facing text for a failed backend call, by operation.
pub fn backend_failure(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::CreateExpense | IntentKind::CreateIncome => t("create_failed"),
        IntentKind::DeleteTransaction => t("delete_failed"),
        IntentKind::CreateRule => t("rule_failed"),
        _ => t("query_failed"),
    }
}

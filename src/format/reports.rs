//! Replies for balance, summary, rules and affordability checks.

use super::{money, period_label, t, type_label};
use cuentas_core::finance::{Balance, Rule, Summary};

pub fn balance(b: &Balance) -> String {
    format!(
        "📊 Tu saldo actual es {}\n- Ingresos: {}\n- Gastos: {}",
        money(b.balance),
        money(b.total_income),
        money(b.total_expenses)
    )
}

/// Period summary with a per-category breakdown, largest first.
pub fn summary(s: &Summary) -> String {
    let mut lines = vec![
        format!("📈 Resumen {}", period_label(&s.period)),
        format!("- Ingresos: {}", money(s.total_income)),
        format!("- Gastos: {}", money(s.total_expenses)),
        format!("- Balance: {}", money(s.total_income - s.total_expenses)),
    ];
    if !s.by_category.is_empty() {
        let mut cats = s.by_category.clone();
        cats.sort_by(|a, b| b.total.total_cmp(&a.total));
        lines.push(String::new());
        lines.push("Por categoría:".to_string());
        lines.extend(
            cats.iter()
                .map(|c| format!("- {}: {}", c.category, money(c.total))),
        );
    }
    lines.join("\n")
}

fn rule_description(rule: &Rule) -> String {
    let mut parts = Vec::new();
    if let Some(ty) = rule.transaction_type {
        parts.push(type_label(ty).to_string());
    }
    if let Some(amount) = rule.amount {
        parts.push(money(amount));
    }
    if let Some(cat) = rule.category.as_deref() {
        parts.push(format!("en {cat}"));
    }
    if let Some(freq) = rule.frequency.as_deref() {
        parts.push(format!("({freq})"));
    }
    if let Some(desc) = rule.description.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("- {desc}"));
    }
    if parts.is_empty() {
        "regla sin detalles".to_string()
    } else {
        parts.join(" ")
    }
}

pub fn rule_created(rule: &Rule) -> String {
    format!("📌 Regla creada: {}", rule_description(rule))
}

pub fn rule_list(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return t("no_rules").to_string();
    }
    let mut lines = vec!["Tus reglas:".to_string()];
    lines.extend(rules.iter().map(|r| format!("- {}", rule_description(r))));
    lines.join("\n")
}

/// Whether the current balance covers `amount`. Read-only.
pub fn affordability(amount: f64, b: &Balance) -> String {
    if b.balance >= amount {
        format!(
            "✅ Sí te alcanza: tienes {} y el gasto es de {}. Te quedarían {}.",
            money(b.balance),
            money(amount),
            money(b.balance - amount)
        )
    } else {
        format!(
            "⚠️ No te alcanza: tienes {} y el gasto es de {}. Te faltan {}.",
            money(b.balance),
            money(amount),
            money(amount - b.balance)
        )
    }
}

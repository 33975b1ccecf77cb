//! LLM-backed intent classifier (OpenAI-compatible endpoint).

use crate::openai::{ChatEndpoint, ChatMessage};
use async_trait::async_trait;
use cuentas_core::{
    config::ClassifierConfig,
    error::CuentasError,
    intent::ClassifiedIntent,
    message::{render_transcript, ConversationEntry},
    traits::IntentClassifier,
};
use serde::Deserialize;
use tracing::{debug, warn};

const CLASSIFIER_PROMPT: &str = "\
Eres el clasificador de intenciones de un asistente de finanzas personales.
Convierte el mensaje actual del usuario en una lista de operaciones.
Responde SOLO con JSON, sin texto adicional: {\"intents\": [ ... ]}.

Cada operación tiene un campo \"kind\" con uno de:
- validate_expense: el usuario pregunta si puede permitirse un gasto (amount)
- create_expense / create_income: registrar un gasto o ingreso (amount, category, description)
- list_transactions: últimos movimientos (type, category, limit)
- list_by_date: movimientos de un día (date)
- list_by_range: movimientos entre dos fechas (start_date, end_date, type, category)
- search: buscar movimientos por texto (query)
- get_balance: saldo actual
- get_summary: resumen de un periodo (period: day|week|month|year, category)
- create_rule: crear una regla o presupuesto (category, amount, type, frequency, description)
- list_rules: ver reglas
- delete_transaction: borrar un movimiento (transaction_id o description)
- question: cualquier otra cosa; incluye la respuesta en \"response\"

Reglas:
- Un mensaje puede contener varias operaciones; devuélvelas en orden.
- amount es un número sin separadores ni símbolos (\"50 mil\" = 50000, \"2 millones\" = 2000000).
- type es \"expense\" o \"income\". Las fechas usan el formato YYYY-MM-DD.
- Usa la conversación reciente solo para resolver referencias (\"eso\", \"lo mismo\").";

/// Classifier that asks a chat model for structured intents.
pub struct LlmClassifier {
    endpoint: ChatEndpoint,
}

impl LlmClassifier {
    /// Create from config values.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            endpoint: ChatEndpoint::new(
                config.base_url.clone(),
                config.resolved_api_key(),
                config.model.clone(),
            ),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifierOutput {
    Wrapped { intents: Vec<ClassifiedIntent> },
    Bare(Vec<ClassifiedIntent>),
    Single(ClassifiedIntent),
}

/// Build the user turn: recent conversation plus the message to classify.
fn build_user_prompt(text: &str, context: &[ConversationEntry]) -> String {
    // The window already ends with the current message; show only what came before.
    let history = match context.split_last() {
        Some((last, rest)) if last.content == text => rest,
        _ => context,
    };
    let today = chrono::Local::now().format("%Y-%m-%d");
    if history.is_empty() {
        format!("Fecha de hoy: {today}\n\nMensaje actual: {text}")
    } else {
        format!(
            "Fecha de hoy: {today}\n\nConversación reciente:\n{}\n\nMensaje actual: {text}",
            render_transcript(history)
        )
    }
}

/// Parse a model reply into intents, tolerating code fences and chatter around the JSON.
pub(crate) fn parse_intents(raw: &str) -> Result<Vec<ClassifiedIntent>, CuentasError> {
    let trimmed = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let json = match (trimmed.find(['{', '[']), trimmed.rfind(['}', ']'])) {
        (Some(start), Some(end)) if end >= start => &trimmed[start..=end],
        _ => {
            return Err(CuentasError::Classifier(format!(
                "no JSON in classifier reply: {}",
                raw.chars().take(120).collect::<String>()
            )))
        }
    };

    let output: ClassifierOutput = serde_json::from_str(json)
        .map_err(|e| CuentasError::Classifier(format!("unparseable classifier reply: {e}")))?;

    let intents = match output {
        ClassifierOutput::Wrapped { intents } => intents,
        ClassifierOutput::Bare(intents) => intents,
        ClassifierOutput::Single(intent) => vec![intent],
    };

    Ok(intents
        .into_iter()
        .map(|mut intent| {
            if let Some(amount) = intent.amount {
                if amount.is_finite() {
                    intent.amount = Some(amount.abs());
                } else {
                    warn!("classifier: dropping non-finite amount");
                    intent.amount = None;
                }
            }
            intent
        })
        .collect())
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    fn name(&self) -> &str {
        "llm"
    }

    async fn classify(
        &self,
        text: &str,
        context: &[ConversationEntry],
    ) -> Result<Vec<ClassifiedIntent>, CuentasError> {
        let messages = vec![
            ChatMessage::system(CLASSIFIER_PROMPT),
            ChatMessage::user(build_user_prompt(text, context)),
        ];
        let raw = self
            .endpoint
            .complete(messages, Some(0.0))
            .await
            .map_err(|e| CuentasError::Classifier(format!("classifier {e}")))?;
        debug!("classifier raw reply: {raw}");
        parse_intents(&raw)
    }
}

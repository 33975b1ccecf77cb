//! LLM-backed reply humanizer.

use crate::openai::{ChatEndpoint, ChatMessage};
use async_trait::async_trait;
use cuentas_core::{
    config::HumanizerConfig, error::CuentasError, intent::IntentKind, traits::Humanizer,
};

const HUMANIZER_PROMPT: &str = "\
Reescribe la respuesta de un asistente de finanzas personales para que suene \
natural y cercana, en español. Conserva TODAS las cifras, fechas y categorías \
exactamente como aparecen; no agregues datos, totales ni consejos que no estén \
en la respuesta original. Máximo 6 líneas.";

/// Humanizer that rewrites report replies with a chat model.
pub struct LlmHumanizer {
    endpoint: ChatEndpoint,
}

impl LlmHumanizer {
    /// Create from config values.
    pub fn from_config(config: &HumanizerConfig) -> Self {
        Self {
            endpoint: ChatEndpoint::new(
                config.base_url.clone(),
                config.resolved_api_key(),
                config.model.clone(),
            ),
        }
    }
}

fn build_request(raw_reply: &str, original_query: &str, kind: IntentKind) -> String {
    format!(
        "Pregunta del usuario: {original_query}\nTipo de consulta: {kind}\n\nRespuesta original:\n{raw_reply}"
    )
}

#[async_trait]
impl Humanizer for LlmHumanizer {
    async fn humanize(
        &self,
        raw_reply: &str,
        original_query: &str,
        kind: IntentKind,
    ) -> Result<String, CuentasError> {
        let messages = vec![
            ChatMessage::system(HUMANIZER_PROMPT),
            ChatMessage::user(build_request(raw_reply, original_query, kind)),
        ];
        let text = self
            .endpoint
            .complete(messages, Some(0.3))
            .await
            .map_err(|e| CuentasError::Humanizer(format!("humanizer {e}")))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CuentasError::Humanizer("empty rewrite".to_string()));
        }
        Ok(text.to_string())
    }
}

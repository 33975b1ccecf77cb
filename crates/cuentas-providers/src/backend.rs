//! REST client for the financial backend.
//!
//! All user-scoped endpoints live under `{base_url}/users/{user_id}`.

use async_trait::async_trait;
use cuentas_core::{
    config::BackendConfig,
    error::CuentasError,
    finance::{Balance, NewRule, NewTransaction, Rule, Summary, Transaction, TransactionFilter},
    traits::FinancialBackend,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Financial backend reached over HTTP/JSON.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl HttpBackend {
    /// Create from config values.
    pub fn from_config(config: &BackendConfig) -> Result<Self, CuentasError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CuentasError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolved_api_key(),
        })
    }

    fn user_url(&self, user_id: &str, path: &str) -> String {
        format!("{}/users/{}/{path}", self.base_url, encode_segment(user_id))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    /// Send a request and decode a JSON success body, mapping every failure to `Backend`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, CuentasError> {
        let resp = self.send(req, what).await?;
        resp.json::<T>()
            .await
            .map_err(|e| CuentasError::Backend(format!("{what}: failed to parse response: {e}")))
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, CuentasError> {
        debug!("backend: {what}");
        let resp = self
            .authorized(req)
            .send()
            .await
            .map_err(|e| CuentasError::Backend(format!("{what}: request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(CuentasError::Backend(format!(
            "{what}: backend returned {status}: {}",
            error_message(&body)
        )))
    }
}

/// Pull the human-readable message out of an error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(ErrorPayload {
            error: Some(msg), ..
        })
        | Ok(ErrorPayload {
            detail: Some(msg), ..
        }) => msg,
        _ => body.chars().take(200).collect(),
    }
}

/// Percent-encode a path segment (user ids are opaque and may contain `:`/`/`).
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn filter_query(filter: &TransactionFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(ty) = filter.transaction_type {
        query.push(("type", ty.as_str().to_string()));
    }
    if let Some(category) = &filter.category {
        query.push(("category", category.clone()));
    }
    if let Some(from) = filter.from {
        query.push(("from", from.to_string()));
    }
    if let Some(to) = filter.to {
        query.push(("to", to.to_string()));
    }
    if let Some(limit) = filter.limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

#[async_trait]
impl FinancialBackend for HttpBackend {
    async fn create_transaction(
        &self,
        user_id: &str,
        tx: &NewTransaction,
    ) -> Result<Transaction, CuentasError> {
        let req = self
            .client
            .post(self.user_url(user_id, "transactions"))
            .json(tx);
        self.send_json(req, "create transaction").await
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CuentasError> {
        let req = self
            .client
            .get(self.user_url(user_id, "transactions"))
            .query(&filter_query(filter));
        self.send_json(req, "list transactions").await
    }

    async fn search_transactions(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<Transaction>, CuentasError> {
        let req = self
            .client
            .get(self.user_url(user_id, "transactions/search"))
            .query(&[("q", query)]);
        self.send_json(req, "search transactions").await
    }

    async fn delete_transaction(&self, user_id: &str, id: &str) -> Result<(), CuentasError> {
        let url = self.user_url(user_id, &format!("transactions/{}", encode_segment(id)));
        self.send(self.client.delete(url), "delete transaction")
            .await
            .map(|_| ())
    }

    async fn balance(&self, user_id: &str) -> Result<Balance, CuentasError> {
        let req = self.client.get(self.user_url(user_id, "balance"));
        self.send_json(req, "balance").await
    }

    async fn summary(&self, user_id: &str, period: &str) -> Result<Summary, CuentasError> {
        let req = self
            .client
            .get(self.user_url(user_id, "summary"))
            .query(&[("period", period)]);
        self.send_json(req, "summary").await
    }

    async fn create_rule(&self, user_id: &str, rule: &NewRule) -> Result<Rule, CuentasError> {
        let req = self.client.post(self.user_url(user_id, "rules")).json(rule);
        self.send_json(req, "create rule").await
    }

    async fn list_rules(&self, user_id: &str) -> Result<Vec<Rule>, CuentasError> {
        let req = self.client.get(self.user_url(user_id, "rules"));
        self.send_json(req, "list rules").await
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("backend not available: {e}");
                false
            }
        }
    }
}

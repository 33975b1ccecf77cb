//! Audit log: records every message processed by the pipeline.

use cuentas_core::{config::AuditConfig, error::CuentasError, shellexpand};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// An entry to write to the audit log.
pub struct AuditEntry {
    pub user_key: String,
    pub input_text: String,
    pub output_text: Option<String>,
    /// Comma-separated intent kinds handled in the turn.
    pub intent_kinds: Option<String>,
    pub processing_ms: Option<i64>,
    pub status: AuditStatus,
}

/// Outcome of an audited turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Ok,
    /// A confirmation prompt was issued instead of executing.
    Deferred,
    Error,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Deferred => "deferred",
            Self::Error => "error",
        }
    }
}

/// Audit logger backed by SQLite.
#[derive(Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    /// Open (or create) the audit database and apply the schema.
    pub async fn open(config: &AuditConfig) -> Result<Self, CuentasError> {
        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CuentasError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| CuentasError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(opts)
            .await
            .map_err(|e| CuentasError::Memory(format!("failed to connect to sqlite: {e}")))?;

        let logger = Self::with_pool(pool).await?;
        info!("Audit log initialized at {db_path}");
        Ok(logger)
    }

    /// Wrap an existing pool, applying the schema if needed.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, CuentasError> {
        sqlx::raw_sql(include_str!("../migrations/001_audit_log.sql"))
            .execute(&pool)
            .await
            .map_err(|e| CuentasError::Memory(format!("audit migration failed: {e}")))?;
        Ok(Self { pool })
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &AuditEntry) -> Result<(), CuentasError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO audit_log \
             (id, user_key, input_text, output_text, intent_kinds, processing_ms, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&entry.user_key)
        .bind(&entry.input_text)
        .bind(&entry.output_text)
        .bind(&entry.intent_kinds)
        .bind(entry.processing_ms)
        .bind(entry.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| CuentasError::Memory(format!("audit log write failed: {e}")))?;

        debug!(
            "audit: {} [{}] {}",
            entry.user_key,
            entry.status.as_str(),
            truncate(&entry.input_text, 80)
        );

        Ok(())
    }

    /// Number of audited turns for a user.
    pub async fn count_for(&self, user_key: &str) -> Result<i64, CuentasError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_log WHERE user_key = ?")
            .bind(user_key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CuentasError::Memory(format!("query failed: {e}")))?;
        Ok(count)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

use thiserror::Error;

/// Top-level error type for Cuentas.
#[derive(Debug, Error)]
pub enum CuentasError {
    /// Error from the financial backend (network, 4xx, 5xx, bad payload).
    #[error("backend error: {0}")]
    Backend(String),

    /// Error from the intent classifier.
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Error from the reply humanizer.
    #[error("humanizer error: {0}")]
    Humanizer(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Audit/storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Fixed limits of the conversational core. These are product constants,
//! not configuration.

/// Amounts strictly above this value need an explicit "sí" before they are written.
pub const CONFIRMATION_THRESHOLD: f64 = 3_000_000.0;

/// How long a pending action stays confirmable.
pub const CONFIRMATION_WINDOW_SECS: i64 = 60;

/// Maximum number of entries kept per user in the conversation window.
pub const CONVERSATION_WINDOW_SIZE: usize = 10;

/// Inactivity after which a user's conversation window is wiped.
pub const CONVERSATION_TIMEOUT_MINUTES: i64 = 30;

//! # cuentas-memory
//!
//! Per-user state for the Cuentas pipeline: the bounded conversation window,
//! the confirmation gate for risky operations, and the SQLite audit log.

pub mod audit;
pub mod gate;
pub mod window;

pub use audit::AuditLogger;
pub use gate::{classify_confirmation_text, ConfirmationGate, ConfirmationReply};
pub use window::ConversationWindow;

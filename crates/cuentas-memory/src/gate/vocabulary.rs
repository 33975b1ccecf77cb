//! Recognizes yes/no replies to a confirmation prompt.

/// How a message reads as an answer to a pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReply {
    Confirm,
    Cancel,
    /// Not an answer; treat the message as a new request.
    Unclear,
}

const AFFIRMATIVE: &[&str] = &[
    "sí", "si", "confirmar", "confirmo", "yes", "ok", "dale", "hazlo", "adelante",
];

const NEGATIVE: &[&str] = &[
    "no", "cancelar", "cancelo", "cancel", "anular", "olvídalo", "mejor no",
];

/// Classify a reply against the fixed affirmative/negative vocabularies.
///
/// Only whole-message matches count: "sí, pero de 200 mil" is `Unclear`.
/// Surrounding punctuation ("¡dale!", "no.") is ignored.
pub fn classify_confirmation_text(text: &str) -> ConfirmationReply {
    let lowered = text.trim().to_lowercase();
    let normalized =
        lowered.trim_matches(|c: char| matches!(c, '!' | '¡' | '.' | '?' | '¿' | ',' | ' '));

    if AFFIRMATIVE.contains(&normalized) {
        ConfirmationReply::Confirm
    } else if NEGATIVE.contains(&normalized) {
        ConfirmationReply::Cancel
    } else {
        ConfirmationReply::Unclear
    }
}

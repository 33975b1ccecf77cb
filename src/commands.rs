//! Slash commands. Handled before anything reaches the classifier.

/// Known commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Forget,
    Pending,
    Confirm,
    Cancel,
}

impl Command {
    /// Parse a command from message text. Returns `None` for regular messages.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        // Strip @botname suffix (e.g. "/ayuda@cuentas_bot" → "/ayuda").
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd.to_lowercase().as_str() {
            "/start" | "/ayuda" | "/help" => Some(Self::Help),
            "/olvidar" | "/forget" => Some(Self::Forget),
            "/pendiente" | "/pending" => Some(Self::Pending),
            "/confirmar" | "/confirm" => Some(Self::Confirm),
            "/cancelar" | "/cancel" => Some(Self::Cancel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Help => "ayuda",
            Self::Forget => "olvidar",
            Self::Pending => "pendiente",
            Self::Confirm => "confirmar",
            Self::Cancel => "cancelar",
        }
    }
}

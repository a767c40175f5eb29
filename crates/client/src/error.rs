use thiserror::Error;

use rxstock_core::DomainError;

/// Shown when the backend fails without a usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// A lookup returned nothing (e.g. unknown invoice number).
    #[error("not found: {0}")]
    NotFound(String),

    /// A local precondition failed; the request was never sent.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// The backend rejected or failed the request.
    #[error("API error ({}): {}", display_status(.status), .message.as_deref().unwrap_or("no message"))]
    Remote {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("network error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "-".to_string(), |s| s.to_string())
}

impl ClientError {
    pub fn remote(status: u16, message: Option<String>) -> Self {
        Self::Remote {
            status: Some(status),
            message: message.filter(|m| !m.trim().is_empty()),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Text for the user: backend and validation messages verbatim, a generic
    /// fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(msg) => msg.clone(),
            Self::Validation(
                DomainError::Validation(msg)
                | DomainError::InvalidId(msg)
                | DomainError::InvariantViolation(msg)
                | DomainError::NotFound(msg),
            ) => msg.clone(),
            Self::Remote {
                message: Some(msg), ..
            } => msg.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::remote(status.as_u16(), None)
        } else {
            Self::Transport(e.to_string())
        }
    }
}

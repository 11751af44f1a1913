//! Error taxonomy for API calls.
//!
//! Every failure an API call can produce falls into one of four buckets:
//! - `Validation`: rejected client-side before any network traffic
//! - `Auth`: a 401 from the server, always followed by a forced logout
//! - `Server`: any other non-2xx, carrying the server-supplied message
//! - `Offline`: transport-level failure (refused connection, DNS, timeout)
//!
//! User-facing messages are in French to match the backend's `detail`
//! strings.

use thiserror::Error;

/// Fallback message when the server's error body cannot be parsed.
pub const GENERIC_SERVER_ERROR: &str = "Erreur serveur";

/// Typed failure for any API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input rejected before any network call was made.
    #[error("{0}")]
    Validation(String),

    /// The server returned 401; the session is no longer valid.
    #[error("Session expirée, veuillez vous reconnecter")]
    Auth(u16),

    /// The server answered with a non-2xx status and (where parseable)
    /// a human-readable message.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The server could not be reached at the transport level.
    #[error("Impossible de contacter le serveur. Vérifiez votre connexion internet.")]
    Offline,
}

impl ApiError {
    /// Build the appropriate error for a non-2xx HTTP status.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        if status == 401 {
            ApiError::Auth(status)
        } else {
            ApiError::Server {
                status,
                message: message.unwrap_or_else(|| GENERIC_SERVER_ERROR.to_string()),
            }
        }
    }

    /// True for transport-level failures.
    pub fn is_offline(&self) -> bool {
        matches!(self, ApiError::Offline)
    }

    /// True for 401 responses.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth(status) | ApiError::Server { status, .. } => Some(*status),
            ApiError::Validation(_) | ApiError::Offline => None,
        }
    }
}

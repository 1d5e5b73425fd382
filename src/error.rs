//! Error types shared by the API client and the session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    /// Connection, DNS or body read failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status on a raw (non-envelope) call.
    #[error("{command}: HTTP {status}")]
    Http { command: String, status: u16 },

    /// The backend answered with an envelope whose status is not "OK".
    #[error("status: {0}")]
    Backend(String),

    /// A request the client refuses to send, e.g. seeding an empty selection.
    #[error("{0}")]
    Invalid(String),

    /// Config text rejected before it was sent.
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AdminError {
    /// Errors reported by the backend itself, as opposed to transport problems.
    pub fn is_backend(&self) -> bool {
        matches!(self, AdminError::Backend(_))
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;

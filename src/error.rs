//! Error types shared by the session and insight workflows.

use thiserror::Error;

/// Failure conditions surfaced to callers of the managers.
///
/// NotFound, Unauthorized and Validation are raised before any external call
/// or store write; ExternalService wraps failures of the generator, the store
/// or the voice client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Referenced document does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// Caller does not own the referenced session
    #[error("user '{user_id}' is not allowed to access session '{session_id}'")]
    Unauthorized { user_id: String, session_id: String },

    /// Caller supplied unusable input
    #[error("validation failed: {0}")]
    Validation(String),

    /// A collaborator (generator, store, voice client) failed or misbehaved
    #[error("{service} failure: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    /// Required configuration is missing
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn unauthorized(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self::Unauthorized {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Wrap an adapter error, keeping its context chain in the message
    pub fn external(service: &'static str, err: anyhow::Error) -> Self {
        Self::ExternalService {
            service,
            message: format!("{err:#}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalService { .. })
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Profile update failed: {0}")]
    Mutation(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Env error: {0}")]
    EnvError(String),

    #[error("Internal server error")]
    InternalError,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn to_response(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Persistence(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Mutation(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Catalog(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::HttpClient(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            AppError::Serialization(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Deserialization(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::EnvError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected server error".into(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        }
    }

    /// Re-labels a collaborator failure as a persistence failure. Local
    /// validation, auth and not-found outcomes pass through untouched.
    pub fn into_persistence(self) -> Self {
        match self {
            AppError::Validation(_)
            | AppError::Auth(_)
            | AppError::Unauthorized(_)
            | AppError::NotFound(_)
            | AppError::Persistence(_) => self,
            other => AppError::Persistence(other.to_string()),
        }
    }

    /// Same as [`AppError::into_persistence`] for profile updates.
    pub fn into_mutation(self) -> Self {
        match self {
            AppError::Validation(_)
            | AppError::Auth(_)
            | AppError::Unauthorized(_)
            | AppError::Mutation(_) => self,
            other => AppError::Mutation(other.to_string()),
        }
    }
}

//! Application-wide error types.
//!
//! [`AppError`] covers infrastructure failures (database, migrations,
//! configuration).  [`ApiError`] is the request-level taxonomy every handler
//! returns; its [`IntoResponse`] impl is the single place where error kinds
//! are mapped to HTTP status codes and JSON bodies.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Field name → human readable message, ordered for stable output.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// A present field that failed a pattern check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    WalletAddress,
    TransactionHash,
    Email,
    VerificationStatus,
}

impl FormatError {
    pub fn message(self) -> &'static str {
        match self {
            Self::WalletAddress => "Invalid wallet address format",
            Self::TransactionHash => "Invalid transaction hash format",
            Self::Email => "Invalid email format",
            Self::VerificationStatus => "Invalid verification status",
        }
    }
}

/// Entities a request can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Campaign,
    Contribution,
    KycRecord,
    /// A contribution looked up by its on-chain transaction hash.
    Transaction,
}

impl Entity {
    pub fn not_found_message(self) -> &'static str {
        match self {
            Self::Campaign => "Campaign not found",
            Self::Contribution => "Contribution not found",
            Self::KycRecord => "KYC record not found",
            Self::Transaction => "Transaction not found",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Required or conditionally-required fields are missing or invalid.
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{}", .0.message())]
    Format(FormatError),

    #[error("{}", .0.not_found_message())]
    NotFound(Entity),

    /// A query parameter or body field the operation cannot run without.
    #[error("{0}")]
    MissingParameter(&'static str),

    #[error("Request body could not be parsed: {0}")]
    BadRequest(String),

    #[error("Too many contribution attempts, please try again later.")]
    RateLimited { retry_after: String },

    #[error("Reviewer authorization required")]
    Unauthorized,

    /// The store rejected a read or write.  The backend message is passed
    /// through to the client.
    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{context}: {message}")]
    Unexpected {
        context: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn persistence(context: &'static str, source: sqlx::Error) -> Self {
        Self::Persistence { context, source }
    }

    pub fn unexpected(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Unexpected {
            context,
            message: err.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Format(_)
            | Self::MissingParameter(_)
            | Self::BadRequest(_)
            | Self::Persistence { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(details) => json!({
                "error": "Validation failed",
                "details": details,
            }),
            Self::Format(kind) => json!({ "error": kind.message() }),
            Self::NotFound(entity) => json!({ "error": entity.not_found_message() }),
            Self::MissingParameter(msg) => json!({ "error": msg }),
            Self::BadRequest(message) => json!({
                "error": "Invalid request body",
                "message": message,
            }),
            Self::RateLimited { retry_after } => json!({
                "error": self.to_string(),
                "retryAfter": retry_after,
            }),
            Self::Unauthorized => json!({ "error": self.to_string() }),
            Self::Persistence { context, source } => {
                error!("{context}: {source}");
                json!({ "error": context, "message": source.to_string() })
            }
            Self::Unexpected { context, message } => {
                error!("{context}: {message}");
                json!({ "error": context, "message": message })
            }
        };
        (status, Json(body)).into_response()
    }
}

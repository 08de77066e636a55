//! Error types for the ledger and the HTTP boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::capacity::SymbolError;

/// Failures of redirect ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("QR code not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("corrupt record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no free short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },
}

impl From<redb::DatabaseError> for LedgerError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::TransactionError> for LedgerError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::TableError> for LedgerError {
    fn from(err: redb::TableError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::StorageError> for LedgerError {
    fn from(err: redb::StorageError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<redb::CommitError> for LedgerError {
    fn from(err: redb::CommitError) -> Self {
        Self::Storage(err.into())
    }
}

/// Errors surfaced by HTTP handlers
///
/// Storage details are logged and replaced by a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Ledger(LedgerError::Validation(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Ledger(LedgerError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Symbol(SymbolError::CapacityExceeded { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Symbol(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message that is safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            AppError::Ledger(LedgerError::Validation(msg)) | AppError::BadRequest(msg) => {
                msg.clone()
            }
            AppError::Ledger(LedgerError::NotFound(_)) => "QR code not found".to_string(),
            AppError::Ledger(_) => "Server error".to_string(),
            AppError::Symbol(err) => err.to_string(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Ledger(LedgerError::Validation(_)) | AppError::BadRequest(_) => "validation",
            AppError::Ledger(LedgerError::NotFound(_)) => "not_found",
            AppError::Ledger(_) => "storage",
            AppError::Symbol(SymbolError::CapacityExceeded { .. }) => "capacity_exceeded",
            AppError::Symbol(_) => "invalid_symbol",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.public_message(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

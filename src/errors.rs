//! Centralized error handling.
//!
//! Provides a unified error type for repository operations and the CLI.
//! Absence on point lookups is not represented here: those return
//! `Ok(None)`.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Unexpected failure from the underlying store
    #[error("Store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: DbErr,
    },

    /// Insert rejected by a uniqueness rule (username or email)
    #[error("Constraint violation during {operation}: {detail}")]
    ConstraintViolation {
        operation: &'static str,
        detail: String,
    },

    /// Targeted mutation matched no row
    #[error("User with ID {id} not found")]
    NotFound { id: i32 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Get error code for callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Store { .. } => "STORE_ERROR",
            AppError::ConstraintViolation { .. } => "CONSTRAINT_VIOLATION",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, AppError::ConstraintViolation { .. })
    }

    /// Wrap a store failure with the operation that caused it
    pub fn store(operation: &'static str, source: DbErr) -> Self {
        tracing::error!(operation, error = %source, "Store operation failed");
        AppError::Store { operation, source }
    }

    /// Classify an insert failure using the driver's structured error kind.
    ///
    /// Only unique violations become `ConstraintViolation`; everything
    /// else stays a `Store` error.
    pub fn from_insert(operation: &'static str, source: DbErr) -> Self {
        let kind = source.sql_err();
        Self::classify_insert(operation, source, kind)
    }

    fn classify_insert(operation: &'static str, source: DbErr, kind: Option<SqlErr>) -> Self {
        match kind {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::warn!(operation, %detail, "Uniqueness constraint violated");
                AppError::ConstraintViolation { operation, detail }
            }
            _ => AppError::store(operation, source),
        }
    }

    pub fn not_found(id: i32) -> Self {
        tracing::warn!(id, "No user row matched");
        AppError::NotFound { id }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

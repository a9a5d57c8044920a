//! Error types for OpenBudget

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or constraint-violating input
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Convert an error raised by a write statement.
    ///
    /// SQLite constraint failures (UNIQUE, CHECK, NOT NULL, FOREIGN KEY) are
    /// caused by the submitted data and become `Validation`; anything else
    /// stays a backend error.
    pub fn from_write(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == ErrorCode::ConstraintViolation =>
            {
                let detail = msg.clone().unwrap_or_else(|| e.to_string());
                Self::Validation(constraint_message(&detail))
            }
            other => Self::Database(other),
        }
    }

    /// True for errors caused by the caller's input rather than the backend
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

/// Rewrite raw SQLite constraint text into something a client can act on
fn constraint_message(detail: &str) -> String {
    if let Some(columns) = detail.strip_prefix("UNIQUE constraint failed: ") {
        if columns == "categories.name" {
            return "Category name must be unique".to_string();
        }
        return format!("Duplicate value for {}", columns);
    }
    if detail.starts_with("FOREIGN KEY constraint failed") {
        return "Referenced category or budget does not exist".to_string();
    }
    if let Some(column) = detail.strip_prefix("NOT NULL constraint failed: ") {
        return format!("{} is required", column);
    }
    detail.to_string()
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_message_unique_name() {
        assert_eq!(
            constraint_message("UNIQUE constraint failed: categories.name"),
            "Category name must be unique"
        );
    }

    #[test]
    fn test_constraint_message_foreign_key() {
        assert_eq!(
            constraint_message("FOREIGN KEY constraint failed"),
            "Referenced category or budget does not exist"
        );
    }

    #[test]
    fn test_non_constraint_error_stays_backend() {
        let err = Error::from_write(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, Error::Database(_)));
        assert!(!err.is_client_error());
    }
}

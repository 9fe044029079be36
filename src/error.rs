//! Error types for toolbind
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in toolbind
#[derive(Debug, Error)]
pub enum ToolbindError {
    /// Requested tool ids are missing from the catalog or not active.
    ///
    /// Carries every offending id, not just the first one found.
    #[error("Validation failed: {message} (invalid ids: {})", join_ids(invalid_ids))]
    Validation { message: String, invalid_ids: Vec<String> },

    /// Request shape violation (agent id length, page/size bounds, ...)
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// A concurrent write for the same agent raced this one; safe to retry
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ToolbindError {
    /// Shorthand for an [`ToolbindError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether repeating the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

fn join_ids(ids: &[String]) -> String {
    ids.join(", ")
}

/// Result type alias for toolbind operations
pub type Result<T> = std::result::Result<T, ToolbindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_ids() {
        let err = ToolbindError::Validation {
            message: "Some tool IDs do not exist or are not active".to_string(),
            invalid_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Validation failed: Some tool IDs do not exist or are not active (invalid ids: a, b)"
        );
    }

    #[test]
    fn test_invalid_input_error() {
        let err = ToolbindError::invalid_input("size", "must be greater than 0");
        assert_eq!(err.to_string(), "Invalid input for 'size': must be greater than 0");
    }

    #[test]
    fn test_conflict_is_retryable() {
        assert!(ToolbindError::Conflict("busy".to_string()).is_retryable());
        assert!(!ToolbindError::NotFound("tool".to_string()).is_retryable());
        assert!(!ToolbindError::invalid_input("page", "must be >= 1").is_retryable());
    }

    #[test]
    fn test_storage_error() {
        let err = ToolbindError::Storage("file locked".to_string());
        assert_eq!(err.to_string(), "Storage error: file locked");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ToolbindError = io_err.into();
        assert!(matches!(err, ToolbindError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ToolbindError = json_err.into();
        assert!(matches!(err, ToolbindError::Json(_)));
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: ToolbindError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, ToolbindError::Sqlite(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(ToolbindError::Conflict("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}

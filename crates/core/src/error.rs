//! Error types for SpamGuard
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for SpamGuard
#[derive(Error, Debug)]
pub enum SpamGuardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Keyword is empty")]
    EmptyKeyword,

    #[error("Index {index} out of range for {len} keywords")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for SpamGuard operations
pub type Result<T> = std::result::Result<T, SpamGuardError>;

impl SpamGuardError {
    /// Whether the condition only needs reporting to the user.
    ///
    /// Input problems leave the keyword list untouched, so the caller can
    /// simply show [`user_message`](Self::user_message) and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpamGuardError::EmptyKeyword
                | SpamGuardError::IndexOutOfRange { .. }
                | SpamGuardError::NotFound(_)
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SpamGuardError::EmptyKeyword => "Please enter a keyword".to_string(),
            SpamGuardError::IndexOutOfRange { index, .. } => {
                format!("No keyword at position {}; the list has changed, please refresh", index)
            }
            SpamGuardError::NotFound(keyword) => format!("Keyword not in list: {}", keyword),
            SpamGuardError::Io(e) => format!("Could not access keyword storage: {}", e),
            SpamGuardError::Storage(msg) => format!("Could not access keyword storage: {}", msg),
            SpamGuardError::Config(msg) => format!("Configuration error: {}", msg),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_recoverable() {
        assert!(SpamGuardError::EmptyKeyword.is_recoverable());
        assert!(SpamGuardError::IndexOutOfRange { index: 4, len: 2 }.is_recoverable());
        assert!(!SpamGuardError::Storage("disk full".into()).is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(SpamGuardError::EmptyKeyword.user_message(), "Please enter a keyword");
        let stale = SpamGuardError::IndexOutOfRange { index: 7, len: 3 };
        assert!(stale.user_message().contains("position 7"));
        assert_eq!(stale.to_string(), "Index 7 out of range for 3 keywords");
    }
}

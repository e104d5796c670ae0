use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-wide error types with categories for better error handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Filesystem errors (permission, disk full, missing directory, etc.)
    Storage(String),

    /// The addressed media file does not exist
    NotFound(String),

    /// Malformed caller payload (undecodable base64, empty body, etc.)
    Payload(String),

    /// Rejected media identifier (empty, traversal sequences, bad charset)
    Identifier(String),

    /// Generic errors that don't fit other categories
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Storage(msg) => write!(f, "Storage Error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Payload(msg) => write!(f, "Payload Error: {}", msg),
            AppError::Identifier(msg) => write!(f, "Identifier Error: {}", msg),
            AppError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Returns a user-friendly title for the error
    pub fn title(&self) -> &str {
        match self {
            AppError::Storage(_) => "Storage Error",
            AppError::NotFound(_) => "Not Found",
            AppError::Payload(_) => "Invalid Media Data",
            AppError::Identifier(_) => "Invalid Identifier",
            AppError::Other(_) => "Error",
        }
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        match self {
            AppError::Storage(msg)
            | AppError::NotFound(msg)
            | AppError::Payload(msg)
            | AppError::Identifier(msg)
            | AppError::Other(msg) => msg,
        }
    }
}

/// Convert from String to AppError::Other
impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::Other(error)
    }
}

/// Convert from &str to AppError::Other
impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::Other(error.to_string())
    }
}

/// Error event payload sent to the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub error: AppError,
    pub timestamp: u64,
    pub context: Option<String>,
}

impl ErrorEvent {
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage Error: disk full");
    }

    #[test]
    fn test_error_title() {
        let err = AppError::Payload("bad base64".to_string());
        assert_eq!(err.title(), "Invalid Media Data");
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::NotFound("File not found".to_string());
        assert_eq!(err.message(), "File not found");
    }

    #[test]
    fn test_from_string() {
        let err: AppError = "test error".into();
        assert!(matches!(err, AppError::Other(_)));
    }

    #[test]
    fn test_serialized_shape() {
        let err = AppError::Identifier("../etc".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Identifier");
        assert_eq!(json["message"], "../etc");
    }

    #[test]
    fn test_error_event() {
        let event = ErrorEvent::new(AppError::Storage("write failed".to_string()))
            .with_context("Save Snapshot");

        assert!(event.context.is_some());
        assert_eq!(event.context.unwrap(), "Save Snapshot");
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request rejected by backend (HTTP {status}): {message}")]
    RejectedError { status: u16, message: String },

    #[error("Translation job failed: {message}")]
    JobFailure { message: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Unexpected response from backend: {message}")]
    ProtocolError { message: String },

    #[error("Configuration error on {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Backend,
    Workflow,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TranslatorError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Input,
            Self::NetworkError(_) => ErrorCategory::Network,
            Self::RejectedError { .. } | Self::JobFailure { .. } | Self::ProtocolError { .. } => {
                ErrorCategory::Backend
            }
            Self::InvalidOperation { .. } => ErrorCategory::Workflow,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidOperation { .. } => ErrorSeverity::Low,
            Self::NetworkError(_) => ErrorSeverity::Medium,
            Self::ValidationError { .. }
            | Self::RejectedError { .. }
            | Self::JobFailure { .. }
            | Self::ProtocolError { .. }
            | Self::ConfigError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    /// 暫時性的傳輸錯誤；輪詢器目前仍視為終止狀態
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(e) => e.is_timeout() || e.is_connect(),
            Self::RejectedError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { field, message } => {
                format!("Invalid {}: {}", field.replace('_', " "), message)
            }
            Self::NetworkError(_) => "Could not reach the translation service".to_string(),
            Self::RejectedError { message, .. } => {
                format!("The translation service rejected the document: {}", message)
            }
            Self::JobFailure { message } => format!("Translation failed: {}", message),
            Self::InvalidOperation { message } => message.clone(),
            Self::ProtocolError { .. } => {
                "The translation service returned an unexpected response".to_string()
            }
            Self::ConfigError { field, message } => {
                format!("Configuration problem in {}: {}", field, message)
            }
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::SerializationError(_) => "Could not encode or decode data".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => {
                "Select a non-empty PDF within the size limit and two different language codes"
            }
            Self::NetworkError(_) => {
                "Check that the translation service is running and reachable, then try again"
            }
            Self::RejectedError { .. } => "Check the uploaded file and language pair",
            Self::JobFailure { .. } => "Re-upload the document and start a new translation",
            Self::InvalidOperation { .. } => "Wait for the current translation or reset first",
            Self::ProtocolError { .. } => "Make sure the API base URL points at the translator backend",
            Self::ConfigError { .. } => "Fix the configuration value and run again",
            Self::IoError(_) => "Check the file path and permissions",
            Self::SerializationError(_) => "Report this issue with the verbose log attached",
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = TranslatorError::validation("file", "empty file");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = TranslatorError::invalid_operation("translation already running");
        assert_eq!(err.category(), ErrorCategory::Workflow);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.user_friendly_message(), "translation already running");
    }

    #[test]
    fn test_rejected_retryable_only_for_server_errors() {
        let client_side = TranslatorError::RejectedError {
            status: 400,
            message: "only PDF files are supported".to_string(),
        };
        let server_side = TranslatorError::RejectedError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(!client_side.is_retryable());
        assert!(server_side.is_retryable());
        assert!(!TranslatorError::JobFailure {
            message: "boom".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_user_friendly_message_humanizes_field() {
        let err = TranslatorError::validation("source_language", "cannot be empty");
        assert_eq!(
            err.user_friendly_message(),
            "Invalid source language: cannot be empty"
        );
    }
}

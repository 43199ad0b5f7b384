//! Error types for the testgen crate.

use thiserror::Error;

/// Errors raised by prompt building, generation, templates and exports.
///
/// Malformed model output is never an error: the reconciler absorbs it
/// into a fallback table. Only missing preconditions and infrastructure
/// failures surface here.
#[derive(Error, Debug, Clone)]
pub enum TestgenError {
    // Precondition errors (block the action before any service call)
    #[error("No use case text supplied. Upload a use case file or paste the use case first.")]
    EmptyInput,

    #[error("No test case template is available. Upload a template or configure default columns.")]
    SchemaMissing,

    #[error("No BRD available. Generate the BRD first.")]
    BrdMissing,

    // Schema and template errors
    #[error("Duplicate column '{name}' in schema")]
    DuplicateColumn { name: String },

    #[error("Unsupported template file '{name}': expected .csv or .xlsx")]
    UnsupportedTemplate { name: String },

    #[error("Template '{name}' has no header row")]
    TemplateEmpty { name: String },

    #[error("Failed to read template '{name}': {reason}")]
    TemplateReadError { name: String, reason: String },

    // Export errors
    #[error("Failed to export {format}: {reason}")]
    ExportError { format: String, reason: String },

    // Storage errors
    #[error("Failed to read file '{path}': {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    FileWriteError { path: String, reason: String },

    #[error("Failed to parse JSON: {reason}")]
    JsonParseError { reason: String },

    #[error("IO error: {reason}")]
    Io { reason: String },

    // Configuration errors
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    // AI errors
    #[error("AI error: {0}")]
    Ai(String),

    #[error("AI provider not configured: {provider}")]
    ProviderNotConfigured { provider: String },

    #[error("AI model not supported: {model}")]
    ModelNotSupported { model: String },

    #[error("AI rate limit exceeded")]
    AiRateLimitExceeded,

    #[error("AI request timeout")]
    AiTimeout,

    // Shell errors
    #[error("Session '{id}' not found")]
    SessionNotFound { id: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

impl TestgenError {
    /// True for errors that block an action because user input is missing,
    /// as opposed to failures of the service or the host.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::SchemaMissing
                | Self::BrdMissing
                | Self::DuplicateColumn { .. }
                | Self::UnsupportedTemplate { .. }
                | Self::TemplateEmpty { .. }
                | Self::TemplateReadError { .. }
                | Self::InvalidArgument { .. }
        )
    }
}

impl From<std::io::Error> for TestgenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TestgenError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParseError {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for testgen operations
pub type TestgenResult<T> = Result<T, TestgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TestgenError::DuplicateColumn {
            name: "Title".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate column 'Title' in schema");
    }

    #[test]
    fn test_precondition_classification() {
        assert!(TestgenError::EmptyInput.is_precondition());
        assert!(TestgenError::SchemaMissing.is_precondition());
        assert!(TestgenError::BrdMissing.is_precondition());
        assert!(!TestgenError::AiTimeout.is_precondition());
        assert!(!TestgenError::Ai("boom".to_string()).is_precondition());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TestgenError = io_err.into();
        assert!(matches!(err, TestgenError::Io { .. }));
    }
}

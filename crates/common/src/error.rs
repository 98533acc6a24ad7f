//! Error types for AutoMed.

use serde::Serialize;
use thiserror::Error;

/// One handler's failed `stop` during a registry-wide teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownFailure {
    pub handler_id: String,
    pub reason: String,
}

impl std::fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.handler_id, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum AutoMedError {
    #[error("No primary assessor handler is registered")]
    NoPrimaryAssessor,

    #[error("Handler '{0}' is already registered")]
    DuplicateHandler(String),

    #[error("Handler '{0}' is not registered")]
    HandlerNotFound(String),

    #[error("Handler '{handler}' failed to start: {reason}")]
    HandlerSetup { handler: String, reason: String },

    #[error("Handler '{handler}' failed to produce a finding: {reason}")]
    HandlerInvocation { handler: String, reason: String },

    #[error("{} handler(s) failed to stop: {}", .0.len(), join_failures(.0))]
    RegistryTeardown(Vec<TeardownFailure>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AutoMedError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoPrimaryAssessor => "NO_PRIMARY_ASSESSOR",
            Self::DuplicateHandler(_) => "DUPLICATE_HANDLER",
            Self::HandlerNotFound(_) => "HANDLER_NOT_FOUND",
            Self::HandlerSetup { .. } => "HANDLER_SETUP_FAILED",
            Self::HandlerInvocation { .. } => "HANDLER_INVOCATION_FAILED",
            Self::RegistryTeardown(_) => "REGISTRY_TEARDOWN_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub fn invocation(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HandlerInvocation {
            handler: handler.into(),
            reason: reason.into(),
        }
    }
}

fn join_failures(failures: &[TeardownFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, AutoMedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_error_lists_every_failure() {
        let err = AutoMedError::RegistryTeardown(vec![
            TeardownFailure {
                handler_id: "CardioBotMock".into(),
                reason: "socket closed".into(),
            },
            TeardownFailure {
                handler_id: "NeuroBotMock".into(),
                reason: "panicked".into(),
            },
        ]);

        let text = err.to_string();
        assert!(text.starts_with("2 handler(s) failed to stop"));
        assert!(text.contains("CardioBotMock: socket closed"));
        assert!(text.contains("NeuroBotMock: panicked"));
        assert_eq!(err.code(), "REGISTRY_TEARDOWN_FAILED");
    }

    #[test]
    fn test_codes_are_distinct_per_kind() {
        assert_eq!(AutoMedError::NoPrimaryAssessor.code(), "NO_PRIMARY_ASSESSOR");
        assert_eq!(
            AutoMedError::invocation("x", "timed out").code(),
            "HANDLER_INVOCATION_FAILED"
        );
        assert_ne!(
            AutoMedError::DuplicateHandler("a".into()).code(),
            AutoMedError::HandlerNotFound("a".into()).code()
        );
    }
}

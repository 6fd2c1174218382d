//! Result and error types for webspec.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for webspec operations
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while locating, acting, asserting or loading suites
#[derive(Debug, Error)]
pub enum SpecError {
    /// Selector never resolved within the timeout
    #[error("Timed out retrying after {elapsed_ms}ms: Expected to find element: {selector}, but never found it.")]
    NotFound {
        /// Selector that was polled
        selector: String,
        /// Time spent polling
        elapsed_ms: u64,
    },

    /// Element resolved but cannot receive a genuine user interaction
    #[error("Element {selector} is not actionable: it {reason}. Pass force to disable actionability checking.")]
    NotActionable {
        /// Selector of the element
        selector: String,
        /// Why the element failed the actionability check
        reason: String,
    },

    /// Retry boundary exceeded; wraps the last underlying failure
    #[error("Timed out retrying after {ms}ms ({attempts} attempts): {last}")]
    Timeout {
        /// Elapsed milliseconds when the retry loop gave up
        ms: u64,
        /// Number of attempts made
        attempts: usize,
        /// Last failure observed before giving up
        last: Box<SpecError>,
    },

    /// An expectation inside a case body was false
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Selector the expectation targeted, if any
        selector: Option<String>,
        /// Error message
        message: String,
    },

    /// Element matched but is not attached to the page yet (transient)
    #[error("Element {selector} is not attached to the page yet")]
    Detached {
        /// Selector of the element
        selector: String,
    },

    /// Navigation failed
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Page driver reported a non-recoverable error
    #[error("Page driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Selector string is unusable
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// Offending selector
        selector: String,
        /// Why it was rejected
        reason: String,
    },

    /// Operation called in the wrong state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Spec file could not be parsed or converted into a registry
    #[error("Spec file {path}: {message}")]
    SpecFile {
        /// File the error came from
        path: String,
        /// Error message
        message: String,
    },

    /// Fixture lookup or loading failed
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SpecError {
    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            selector: None,
            message: message.into(),
        }
    }

    /// Create an assertion error about the element matched by `selector`
    #[must_use]
    pub fn assertion_on(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Assertion {
            selector: Some(selector.into()),
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the retry engine may swallow this failure and poll again
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Detached { .. } | Self::NotFound { .. } | Self::Assertion { .. }
        )
    }

    /// Failure category used in run reports
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::NotActionable { .. } => FailureKind::NotActionable,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Assertion { .. } => FailureKind::Assertion,
            _ => FailureKind::Driver,
        }
    }

    /// Selector involved in the failure, if any
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        match self {
            Self::NotFound { selector, .. }
            | Self::NotActionable { selector, .. }
            | Self::Detached { selector }
            | Self::InvalidSelector { selector, .. } => Some(selector),
            Self::Assertion { selector, .. } => selector.as_deref(),
            Self::Timeout { last, .. } => last.selector(),
            _ => None,
        }
    }
}

/// Category of a case failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Selector never resolved
    NotFound,
    /// Element not interactable and force not set
    NotActionable,
    /// Generic retry boundary exceeded
    Timeout,
    /// Expectation was false
    Assertion,
    /// Driver, navigation or other non-retryable failure
    Driver,
    /// Case body panicked
    Panic,
}

impl FailureKind {
    /// Whether this failure ends a case as timed out rather than failed
    #[must_use]
    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::NotFound | Self::Timeout)
    }

    /// Stable lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotActionable => "not_actionable",
            Self::Timeout => "timeout",
            Self::Assertion => "assertion",
            Self::Driver => "driver",
            Self::Panic => "panic",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_matches_runner_wording() {
        let err = SpecError::NotFound {
            selector: "#contact-us".to_string(),
            elapsed_ms: 4000,
        };
        assert_eq!(
            err.to_string(),
            "Timed out retrying after 4000ms: Expected to find element: #contact-us, but never found it."
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(SpecError::Detached {
            selector: "a".into()
        }
        .is_retryable());
        assert!(SpecError::assertion("x").is_retryable());
        assert!(!SpecError::driver("boom").is_retryable());
        assert!(!SpecError::NotActionable {
            selector: "a".into(),
            reason: "is not visible".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_timeout_exposes_inner_selector() {
        let err = SpecError::Timeout {
            ms: 100,
            attempts: 3,
            last: Box::new(SpecError::Detached {
                selector: "#late".into(),
            }),
        };
        assert_eq!(err.selector(), Some("#late"));
        assert_eq!(err.kind(), FailureKind::Timeout);
    }

    #[test]
    fn test_assertion_selector() {
        assert_eq!(SpecError::assertion("x").selector(), None);
        let err = SpecError::assertion_on("#name", "expected empty");
        assert_eq!(err.selector(), Some("#name"));
        assert_eq!(err.to_string(), "Assertion failed: expected empty");
    }

    #[test]
    fn test_failure_kind_timeout_split() {
        assert!(FailureKind::NotFound.is_timeout());
        assert!(FailureKind::Timeout.is_timeout());
        assert!(!FailureKind::Assertion.is_timeout());
        assert!(!FailureKind::Panic.is_timeout());
        assert_eq!(FailureKind::NotActionable.to_string(), "not_actionable");
    }
}

//! Error types for package engine operations.
//!
//! Errors are categorized so callers can decide whether an operation is
//! worth retrying. Engine stderr is classified into these categories by
//! [`Error::from_engine_output`].

use thiserror::Error;

/// Categories of engine errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// No package matches the requested spec
    NotFound,
    /// The submitted goal cannot be resolved consistently
    Conflict,
    /// Permission denied
    Permission,
    /// The engine executable is not installed
    EngineNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }
}

/// Errors that can occur while talking to the package engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (mirror unreachable, timeout, checksum mismatch)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed network operation
        message: String,
    },

    /// No package matches the requested spec
    #[error("no package matched: {spec}")]
    NotFound {
        /// The spec that could not be matched
        spec: String,
    },

    /// The goal could not be resolved into a consistent transaction
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Details about what permission was denied
        message: String,
    },

    /// The engine executable could not be found
    #[error("package engine not found: {binary}")]
    EngineNotFound {
        /// Name or path of the missing executable
        binary: String,
    },

    /// The engine handle was used after it was closed
    #[error("engine handle already closed")]
    Closed,

    /// Command execution failed
    #[error("{message}: {stderr}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// Engine output could not be understood
    #[error("unexpected engine output: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::EngineNotFound { .. } => ErrorCategory::EngineNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from engine command output.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_engine_output(stderr: &str, spec: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let trimmed = stderr.trim().to_string();

        if stderr_lower.contains("curl error")
            || stderr_lower.contains("could not resolve host")
            || stderr_lower.contains("failed to download")
            || stderr_lower.contains("cannot download")
            || stderr_lower.contains("timed out")
            || stderr_lower.contains("checksum doesn't match")
            || stderr_lower.contains("failed to synchronize cache")
        {
            return Error::Network { message: trimmed };
        }

        if stderr_lower.contains("no match for argument")
            || stderr_lower.contains("unable to find a match")
            || (stderr_lower.contains("no package") && stderr_lower.contains("available"))
        {
            return Error::NotFound {
                spec: spec.unwrap_or("unknown").to_string(),
            };
        }

        if stderr_lower.contains("problem:")
            || stderr_lower.contains("conflicting requests")
            || stderr_lower.contains("conflicts with")
            || stderr_lower.contains("nothing provides")
            || stderr_lower.contains("depsolve")
        {
            return Error::Conflict { message: trimmed };
        }

        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("operation not permitted")
            || stderr_lower.contains("this command has to be run with superuser")
        {
            return Error::Permission { message: trimmed };
        }

        Error::CommandFailed {
            message: format!(
                "engine command failed{}",
                spec.map(|s| format!(" for {s}")).unwrap_or_default()
            ),
            stderr: trimmed,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Conflict.is_retryable());
    }

    #[test]
    fn test_from_engine_output_network() {
        let err = Error::from_engine_output(
            "Curl error (6): Couldn't resolve host name for https://mirrors.example",
            Some("wget"),
        );
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_engine_output_not_found() {
        let err = Error::from_engine_output("Error: Unable to find a match: nosuchpkg", Some("nosuchpkg"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "no package matched: nosuchpkg");
    }

    #[test]
    fn test_from_engine_output_conflict() {
        let err = Error::from_engine_output(
            "Error:\n Problem: package foo-1.0 requires bar, but none of the providers can be installed",
            Some("foo"),
        );
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_from_engine_output_permission() {
        let err = Error::from_engine_output(
            "Error: This command has to be run with superuser privileges",
            None,
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_from_engine_output_fallback() {
        let err = Error::from_engine_output("something odd\n", Some("foo"));
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.to_string(), "engine command failed for foo: something odd");
    }
}

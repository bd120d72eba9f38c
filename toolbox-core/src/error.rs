//! Error types for the toolbox primitives

use nix::errno::Errno;
use thiserror::Error;

/// Toolbox error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A system call failed
    ///
    /// Rendered as `operation(params): errno`, for example
    /// `unshare(CLONE_NEWNS): EPERM: Operation not permitted`.
    #[error("{operation}({params}): {errno}")]
    OperationFailed {
        /// Name of the system call that failed
        operation: &'static str,
        /// Human readable rendering of the arguments it was given
        params: String,
        /// Error reported by the kernel
        errno: Errno,
    },

    /// Caller input rejected before any system call was made
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Malformed procfs content
    #[error("Parse error: {message}")]
    Parse {
        /// Error message
        message: String,
    },

    /// I/O error while reading procfs
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an [`Error::OperationFailed`] for `operation` called with `params`.
    pub fn operation_failed(
        operation: &'static str,
        params: impl Into<String>,
        errno: Errno,
    ) -> Self {
        Self::OperationFailed {
            operation,
            params: params.into(),
            errno,
        }
    }

    /// Build an [`Error::InvalidConfig`].
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Build an [`Error::Parse`].
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Name of the failed system call, if this is an operation failure.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::OperationFailed { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Raw OS error code carried by this error, if any.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::OperationFailed { errno, .. } => Some(*errno as i32),
            Self::Io(e) => e.raw_os_error(),
            Self::InvalidConfig { .. } | Self::Parse { .. } => None,
        }
    }
}

/// Result type alias for toolbox operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failed_display() {
        let err = Error::operation_failed("unshare", "CLONE_NEWNS", Errno::EPERM);
        let rendered = err.to_string();

        assert!(rendered.starts_with("unshare(CLONE_NEWNS): EPERM"));
        assert_eq!(err.operation(), Some("unshare"));
        assert_eq!(err.raw_os_error(), Some(Errno::EPERM as i32));
    }

    #[test]
    fn test_operation_failed_keeps_params() {
        let err = Error::operation_failed("utimes", "/nope", Errno::ENOENT);

        assert!(err.to_string().contains("utimes(/nope): ENOENT"));
        assert_eq!(err.raw_os_error(), Some(Errno::ENOENT as i32));
    }

    #[test]
    fn test_invalid_config_has_no_os_error() {
        let err = Error::invalid_config("unknown namespace \"net\"");

        assert_eq!(err.raw_os_error(), None);
        assert_eq!(err.operation(), None);
        assert!(err.to_string().contains("unknown namespace"));
    }

    #[test]
    fn test_io_error_keeps_code() {
        let err: Error = std::io::Error::from_raw_os_error(2).into();

        assert_eq!(err.raw_os_error(), Some(2));
    }

    #[test]
    fn test_io_error_message_not_repeated() {
        use std::error::Error as _;

        let err: Error = std::io::Error::from_raw_os_error(13).into();
        let message = err.to_string();

        assert_eq!(message.matches("Permission denied").count(), 1);
        assert!(err.source().is_none());
    }
}

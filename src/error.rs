//! Error types for sidecar filesystem operations
//!
//! Every OS-level failure is normalized into an [`AccessError`] carrying a
//! stable [`ErrorCode`] before it crosses the message boundary. Raw errno
//! values never reach a caller.
//!
//! Normalization is idempotent: [`normalize`] returns an existing
//! `AccessError` unchanged, including one that was tunnelled through an
//! `io::Error`.

use crate::service::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SidecarError>;

/// Closed taxonomy of filesystem failures
///
/// The serialized names match the provider error codes expected by the
/// remote editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The entry does not exist
    #[serde(rename = "EntryNotFound")]
    NotFound,
    /// The entry already exists
    #[serde(rename = "EntryExists")]
    AlreadyExists,
    /// A path component is not a directory
    #[serde(rename = "EntryNotADirectory")]
    NotADirectory,
    /// The entry is a directory where a file was expected
    #[serde(rename = "EntryIsADirectory")]
    IsADirectory,
    /// Reserved: the entry does not fit in memory
    #[serde(rename = "EntryExceedsMemoryLimit")]
    ExceedsMemoryLimit,
    /// Reserved: the entry is too large
    #[serde(rename = "EntryTooLarge")]
    TooLarge,
    /// Access was denied
    #[serde(rename = "NoPermissions")]
    NoPermission,
    /// Reserved: the backing filesystem is unavailable
    #[serde(rename = "Unavailable")]
    Unavailable,
    /// Anything not recognized above
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ErrorCode {
    /// Every member of the taxonomy, in declaration order
    pub const ALL: [Self; 9] = [
        Self::NotFound,
        Self::AlreadyExists,
        Self::NotADirectory,
        Self::IsADirectory,
        Self::ExceedsMemoryLimit,
        Self::TooLarge,
        Self::NoPermission,
        Self::Unavailable,
        Self::Unknown,
    ];

    /// Wire name of the code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "EntryNotFound",
            Self::AlreadyExists => "EntryExists",
            Self::NotADirectory => "EntryNotADirectory",
            Self::IsADirectory => "EntryIsADirectory",
            Self::ExceedsMemoryLimit => "EntryExceedsMemoryLimit",
            Self::TooLarge => "EntryTooLarge",
            Self::NoPermission => "NoPermissions",
            Self::Unavailable => "Unavailable",
            Self::Unknown => "Unknown",
        }
    }

    /// Classify an OS error
    ///
    /// The raw errno is consulted first. Errors without an errno (synthesized
    /// by std or by a transport) fall back to their `io::ErrorKind`.
    #[must_use]
    pub fn from_io_error(error: &io::Error) -> Self {
        match error.raw_os_error() {
            Some(errno) => Self::from_errno(errno),
            None => match error.kind() {
                io::ErrorKind::NotFound => Self::NotFound,
                io::ErrorKind::IsADirectory => Self::IsADirectory,
                io::ErrorKind::NotADirectory => Self::NotADirectory,
                io::ErrorKind::AlreadyExists => Self::AlreadyExists,
                io::ErrorKind::PermissionDenied => Self::NoPermission,
                _ => Self::Unknown,
            },
        }
    }

    /// Classify a raw errno value
    #[must_use]
    pub const fn from_errno(errno: i32) -> Self {
        match errno {
            libc::ENOENT => Self::NotFound,
            libc::EISDIR => Self::IsADirectory,
            libc::ENOTDIR => Self::NotADirectory,
            libc::EEXIST => Self::AlreadyExists,
            libc::EPERM | libc::EACCES => Self::NoPermission,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized filesystem failure
///
/// Carries the taxonomy code, a human-readable message and the original OS
/// error. The cause is shared so the value can be cloned and handed across
/// tasks without losing it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AccessError {
    code: ErrorCode,
    message: String,
    #[source]
    cause: Option<Arc<io::Error>>,
}

impl AccessError {
    /// Create an error that has no underlying OS cause
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Classify an OS error and keep it as the cause
    #[must_use]
    pub fn from_io(error: io::Error) -> Self {
        let code = ErrorCode::from_io_error(&error);
        if code == ErrorCode::Unknown {
            debug!("Unclassified OS error mapped to {code}: {error:?}");
        }
        Self {
            code,
            message: error.to_string(),
            cause: Some(Arc::new(error)),
        }
    }

    /// Taxonomy code
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Original OS error, if there was one
    #[must_use]
    pub fn cause(&self) -> Option<&io::Error> {
        self.cause.as_deref()
    }

    /// Error name as presented to the remote editor, e.g. `EntryNotFound (FileSystemError)`
    #[must_use]
    pub fn name(&self) -> String {
        format!("{} (FileSystemError)", self.code)
    }

    /// Check if this error reports a missing entry
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

impl PartialEq for AccessError {
    fn eq(&self, other: &Self) -> bool {
        let same_cause = match (&self.cause, &other.cause) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.code == other.code && self.message == other.message && same_cause
    }
}

impl From<io::Error> for AccessError {
    fn from(error: io::Error) -> Self {
        // An AccessError tunnelled through io::Error is returned as-is
        if error.get_ref().is_some_and(|inner| inner.is::<Self>()) {
            if let Some(inner) = error.into_inner() {
                match inner.downcast::<Self>() {
                    Ok(access) => return *access,
                    Err(other) => return Self::from_io(io::Error::other(other)),
                }
            }
            return Self::new(ErrorCode::Unknown, "empty I/O error");
        }
        Self::from_io(error)
    }
}

/// Normalize any supported failure into an [`AccessError`]
///
/// Idempotent: an `AccessError` passes through unchanged, never re-wrapped.
///
/// # Examples
///
/// ```rust
/// use sidecar_fs::error::{normalize, ErrorCode};
///
/// let err = normalize(std::io::Error::from_raw_os_error(libc::ENOENT));
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(normalize(err.clone()), err);
/// ```
pub fn normalize<E: Into<AccessError>>(error: E) -> AccessError {
    error.into()
}

/// Crate-level error
///
/// `Access` is the only variant describing a real problem with a path.
/// `Unsupported` signals a capability that was never built and is kept apart
/// from every taxonomy code.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// Normalized filesystem failure
    #[error(transparent)]
    Access(#[from] AccessError),

    /// Operation outside the read-only capability surface
    #[error("Operation not supported: {operation}")]
    Unsupported {
        /// The rejected operation
        operation: Operation,
    },

    /// The resource identifier could not be mapped to a local path
    #[error("Invalid resource '{resource}': {reason}")]
    InvalidResource {
        /// Identifier as received
        resource: String,
        /// Why it was rejected
        reason: String,
    },

    /// Unrecognized text encoding hint
    #[error("Unsupported text encoding: {0}")]
    InvalidEncoding(String),

    /// Malformed message on the wire
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The transport itself failed
    #[error("Transport error: {0}")]
    Transport(#[source] io::Error),
}

impl SidecarError {
    /// Shorthand for an unsupported-operation error
    #[must_use]
    pub const fn unsupported(operation: Operation) -> Self {
        Self::Unsupported { operation }
    }

    /// Normalized filesystem error, if this is one
    #[must_use]
    pub const fn as_access(&self) -> Option<&AccessError> {
        match self {
            Self::Access(err) => Some(err),
            _ => None,
        }
    }

    /// Check if this is the unsupported-operation signal
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(libc::ENOENT, ErrorCode::NotFound)]
    #[case(libc::EISDIR, ErrorCode::IsADirectory)]
    #[case(libc::ENOTDIR, ErrorCode::NotADirectory)]
    #[case(libc::EEXIST, ErrorCode::AlreadyExists)]
    #[case(libc::EPERM, ErrorCode::NoPermission)]
    #[case(libc::EACCES, ErrorCode::NoPermission)]
    #[case(libc::ELOOP, ErrorCode::Unknown)]
    #[case(libc::EIO, ErrorCode::Unknown)]
    #[case(libc::ENOSPC, ErrorCode::Unknown)]
    fn test_errno_mapping(#[case] errno: i32, #[case] expected: ErrorCode) {
        let err = normalize(io::Error::from_raw_os_error(errno));
        assert_eq!(err.code(), expected);
        assert_eq!(err.cause().and_then(io::Error::raw_os_error), Some(errno));
    }

    #[rstest]
    #[case(io::ErrorKind::NotFound, ErrorCode::NotFound)]
    #[case(io::ErrorKind::PermissionDenied, ErrorCode::NoPermission)]
    #[case(io::ErrorKind::AlreadyExists, ErrorCode::AlreadyExists)]
    #[case(io::ErrorKind::UnexpectedEof, ErrorCode::Unknown)]
    fn test_kind_fallback_without_errno(#[case] kind: io::ErrorKind, #[case] expected: ErrorCode) {
        let err = normalize(io::Error::new(kind, "synthetic"));
        assert_eq!(err.code(), expected);
        assert_eq!(err.message(), "synthetic");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let first = normalize(io::Error::from_raw_os_error(libc::EACCES));
        let second = normalize(first.clone());
        assert_eq!(first, second);
        assert_eq!(second.code(), ErrorCode::NoPermission);

        // Same cause instance, not a re-wrapped copy
        let a = first.cause().unwrap() as *const io::Error;
        let b = second.cause().unwrap() as *const io::Error;
        assert_eq!(a, b);
    }

    #[test]
    fn test_tunnelled_access_error_is_not_reclassified() {
        let original = AccessError::new(ErrorCode::IsADirectory, "is a directory");
        let tunnelled = io::Error::other(original.clone());
        let back = normalize(tunnelled);
        assert_eq!(back, original);
        assert_eq!(back.code(), ErrorCode::IsADirectory);
    }

    #[test]
    fn test_reserved_codes_exist() {
        // Not produced by any mapping yet, but part of the wire taxonomy
        for code in [
            ErrorCode::ExceedsMemoryLimit,
            ErrorCode::TooLarge,
            ErrorCode::Unavailable,
        ] {
            assert!(ErrorCode::ALL.contains(&code));
            assert!(!code.as_str().is_empty());
        }
        assert_eq!(ErrorCode::ALL.len(), 9);
    }

    #[test]
    fn test_wire_names_match_serde() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
            let back: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }

    #[test]
    fn test_error_name_format() {
        let err = AccessError::new(ErrorCode::NotFound, "gone");
        assert_eq!(err.name(), "EntryNotFound (FileSystemError)");
        assert_eq!(err.to_string(), "gone");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unsupported_is_distinct_from_access() {
        let err = SidecarError::unsupported(Operation::Mkdir);
        assert!(err.is_unsupported());
        assert!(err.as_access().is_none());

        let access: SidecarError = AccessError::new(ErrorCode::Unknown, "x").into();
        assert!(!access.is_unsupported());
        assert!(access.as_access().is_some());
    }
}

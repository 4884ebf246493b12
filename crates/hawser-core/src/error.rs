//! Error taxonomy for remote file system operations.
//!
//! The retry machinery keys off this classification: only transient
//! transport failures ([`VfsError::Io`], and [`VfsError::Connect`] raised
//! mid-operation) are eligible for the single reconnect-and-retry cycle.
//! Server-side rejections ([`VfsError::Protocol`]) and credential failures
//! ([`VfsError::Auth`]) are surfaced unchanged.

use std::fmt;
use std::io;

use thiserror::Error;

/// Classification of a well-formed rejection sent by the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolKind {
    /// The addressed file or directory does not exist.
    NotFound,
    /// The server refused the operation for this principal.
    PermissionDenied,
    /// Create-style operation hit an existing entry.
    AlreadyExists,
    /// A path component that must be a directory is not one.
    NotADirectory,
    /// A file operation was applied to a directory.
    IsADirectory,
    /// Storage allocation exceeded.
    Quota,
    /// The server does not implement the requested operation.
    Unsupported,
    /// Any other well-formed rejection.
    Other,
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProtocolKind::NotFound => "not found",
            ProtocolKind::PermissionDenied => "permission denied",
            ProtocolKind::AlreadyExists => "already exists",
            ProtocolKind::NotADirectory => "not a directory",
            ProtocolKind::IsADirectory => "is a directory",
            ProtocolKind::Quota => "quota exceeded",
            ProtocolKind::Unsupported => "operation unsupported",
            ProtocolKind::Other => "rejected by server",
        };
        f.write_str(s)
    }
}

/// Error type shared by every provider and by the core lifecycle machinery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VfsError {
    /// Transport could not be established (DNS, refused, TLS handshake).
    #[error("cannot connect to {endpoint}: {message}")]
    Connect {
        /// `host:port` of the remote endpoint.
        endpoint: String,
        /// Native client error rendering.
        message: String,
    },

    /// Credentials rejected by the server. Never retried.
    #[error("authentication failed for {user}@{endpoint}")]
    Auth {
        /// User name the server rejected.
        user: String,
        /// `host:port` of the remote endpoint.
        endpoint: String,
    },

    /// I/O failure on an otherwise valid session (reset, timeout, broken
    /// pipe). Consistent with a stale connection; retried exactly once.
    #[error("i/o failure during {op}: {message}")]
    Io {
        /// Short name of the remote operation that failed.
        op: &'static str,
        /// Native client error rendering.
        message: String,
    },

    /// Well-formed rejection from the server. Never retried.
    #[error("{kind}: {path}")]
    Protocol {
        /// What the server objected to.
        kind: ProtocolKind,
        /// Remote path the operation addressed.
        path: String,
    },

    /// Invalid mount configuration (bad URL, missing working directory,
    /// rejected transfer mode). Surfaced at mount-creation time.
    #[error("invalid mount configuration: {0}")]
    Config(String),
}

impl VfsError {
    /// Whether this failure is consistent with a dropped or stale
    /// connection, making the operation eligible for one retry on a
    /// fresh session.
    pub fn is_transient(&self) -> bool {
        matches!(self, VfsError::Io { .. } | VfsError::Connect { .. })
    }

    /// Shorthand for a [`ProtocolKind::NotFound`] rejection.
    pub fn not_found(path: impl Into<String>) -> Self {
        VfsError::Protocol {
            kind: ProtocolKind::NotFound,
            path: path.into(),
        }
    }

    /// Classify a raw [`io::Error`] raised while talking to the remote.
    ///
    /// Some native clients surface server rejections as I/O errors
    /// (libsmbclient hands back errno values); the rejection-shaped kinds
    /// are mapped to [`VfsError::Protocol`], everything else is a
    /// transport failure.
    pub fn from_io(op: &'static str, path: &str, err: &io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ProtocolKind::NotFound,
            io::ErrorKind::PermissionDenied => ProtocolKind::PermissionDenied,
            io::ErrorKind::AlreadyExists => ProtocolKind::AlreadyExists,
            io::ErrorKind::NotADirectory => ProtocolKind::NotADirectory,
            io::ErrorKind::IsADirectory => ProtocolKind::IsADirectory,
            io::ErrorKind::StorageFull => ProtocolKind::Quota,
            io::ErrorKind::DirectoryNotEmpty => ProtocolKind::Other,
            _ => {
                return VfsError::Io {
                    op,
                    message: err.to_string(),
                };
            }
        };
        VfsError::Protocol {
            kind,
            path: path.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let io = VfsError::Io {
            op: "list",
            message: "connection reset".into(),
        };
        let connect = VfsError::Connect {
            endpoint: "example.org:21".into(),
            message: "refused".into(),
        };
        let auth = VfsError::Auth {
            user: "alice".into(),
            endpoint: "example.org:21".into(),
        };
        let protocol = VfsError::not_found("/missing");

        assert!(io.is_transient());
        assert!(connect.is_transient());
        assert!(!auth.is_transient());
        assert!(!protocol.is_transient());
        assert!(!VfsError::Config("bad".into()).is_transient());
    }

    #[test]
    fn io_error_mapping() {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        assert!(matches!(
            VfsError::from_io("stat", "/a", &err),
            VfsError::Protocol {
                kind: ProtocolKind::NotFound,
                ..
            }
        ));

        let err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(VfsError::from_io("read", "/a", &err).is_transient());
    }
}

//! The session capability: what the core asks of a protocol provider.
//!
//! A [`ProviderSession`] wraps one live, authenticated connection. The
//! core never sees protocol detail — framing, handshakes and listing
//! formats belong to the native client crates behind each provider. A
//! [`SessionFactory`] knows how to mint new sessions from the mount
//! identity and options it was constructed with.

use std::io::{Read, Write};
use std::time::SystemTime;

use crate::error::VfsError;

/// Kind of a remote file system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link (reported by SFTP; other protocols fold these into
    /// `Other`).
    Symlink,
    /// Anything else the protocol reports (devices, fifos, unknown).
    Other,
}

impl FileType {
    /// Whether this entry is a directory.
    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }
}

/// Attributes of one remote entry, as far as the protocol reports them.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Entry kind.
    pub file_type: FileType,
    /// Size in bytes; `None` when the protocol does not report it.
    pub size: Option<u64>,
    /// Last modification time; `None` when the protocol does not report
    /// it.
    pub modified: Option<SystemTime>,
}

impl FileInfo {
    /// Attributes of a directory with no size/mtime information.
    pub fn directory() -> Self {
        Self {
            file_type: FileType::Directory,
            size: None,
            modified: None,
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Entry name (no path components).
    pub name: String,
    /// Entry attributes.
    pub info: FileInfo,
}

/// How [`ProviderSession::write_from`] positions its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file's content.
    Overwrite,
    /// Append to the file's content.
    Append,
}

/// What a mounted file system can do; varies per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Capability {
    /// Read file content.
    Read,
    /// Create or replace file content.
    Write,
    /// Append to existing files.
    Append,
    /// List directory children.
    List,
    /// Report entry attributes.
    Stat,
    /// Create directories.
    Mkdir,
    /// Delete files and directories.
    Delete,
    /// Rename entries.
    Rename,
}

/// One live, authenticated connection to a remote file system.
///
/// A session has exactly one owner at any time: either the mount's idle
/// slot or the caller that borrowed it — sessions move by value, so the
/// type system enforces this. All I/O blocks the calling thread.
///
/// Paths are `/`-separated and relative to the mount root.
pub trait ProviderSession: Send {
    /// Whether the underlying transport still looks alive. A `false`
    /// answer at borrow time discards the cached session instead of
    /// handing it out.
    fn is_connected(&self) -> bool;

    /// Tear down the connection. Idempotent: a second call is a no-op.
    /// Failures are logged and swallowed — a socket that will not close
    /// must not fail the file-system-level operation.
    fn disconnect(&mut self);

    /// List the children of a directory.
    fn list(&mut self, path: &str) -> Result<Vec<DirEntry>, VfsError>;

    /// Attributes of one entry.
    fn stat(&mut self, path: &str) -> Result<FileInfo, VfsError>;

    /// Stream a file's content into `sink`; returns the byte count.
    fn read_to(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64, VfsError>;

    /// Stream `source` into a remote file; returns the byte count.
    fn write_from(
        &mut self,
        path: &str,
        source: &mut dyn Read,
        mode: WriteMode,
    ) -> Result<u64, VfsError>;

    /// Create a directory.
    fn mkdir(&mut self, path: &str) -> Result<(), VfsError>;

    /// Delete a file.
    fn remove_file(&mut self, path: &str) -> Result<(), VfsError>;

    /// Delete an empty directory.
    fn remove_dir(&mut self, path: &str) -> Result<(), VfsError>;

    /// Rename an entry within the mount.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), VfsError>;
}

/// Creates, authenticates and configures new sessions for one mount.
///
/// A factory is constructed from a [`crate::MountIdentity`] plus
/// provider-specific options and holds no other state. `create` performs
/// connect, authenticate and protocol-level setup synchronously; it never
/// retries internally — retry policy lives in the mount's invoker.
pub trait SessionFactory: Send + Sync {
    /// Mint a fresh connected session.
    ///
    /// Fails with [`VfsError::Connect`] (unreachable, TLS failure),
    /// [`VfsError::Auth`] (credentials rejected) or [`VfsError::Config`]
    /// (working directory missing, transfer mode rejected).
    fn create(&self) -> Result<Box<dyn ProviderSession>, VfsError>;

    /// Capability set of the provider behind this factory.
    fn capabilities(&self) -> &'static [Capability];

    /// URL scheme this factory serves (`ftp`, `ftps`, `sftp`, `smb`).
    fn scheme(&self) -> &'static str;
}

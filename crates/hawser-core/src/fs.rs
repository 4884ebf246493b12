//! User-facing facade over one mount.
//!
//! [`RemoteFs`] is cheap to clone and safe to share across threads; every
//! operation borrows a session from the mount, runs under the
//! retry-and-reconnect wrapper, and returns the session when done.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::{ProtocolKind, VfsError};
use crate::mount::Mount;
use crate::session::{Capability, DirEntry, FileInfo, SessionFactory, WriteMode};

/// Handle to a mounted remote file system.
#[derive(Clone, Debug)]
pub struct RemoteFs {
    mount: Arc<Mount>,
}

impl RemoteFs {
    /// Mount a remote file system, eagerly connecting the first session.
    pub fn open(factory: Box<dyn SessionFactory>) -> Result<Self, VfsError> {
        Ok(Self {
            mount: Arc::new(Mount::open(factory)?),
        })
    }

    /// Mount without connecting; the first session is created at first
    /// use.
    pub fn open_lazy(factory: Box<dyn SessionFactory>) -> Self {
        Self {
            mount: Arc::new(Mount::open_lazy(factory)),
        }
    }

    /// List the children of a directory.
    pub fn list(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        self.mount.with_session(|s| s.list(path))
    }

    /// Attributes of one entry.
    pub fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        self.mount.with_session(|s| s.stat(path))
    }

    /// Whether an entry exists. A not-found rejection maps to `false`;
    /// every other failure propagates.
    pub fn exists(&self, path: &str) -> Result<bool, VfsError> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(VfsError::Protocol {
                kind: ProtocolKind::NotFound,
                ..
            }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Read a whole file into memory.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        self.mount.with_session(|s| {
            let mut buf = Vec::new();
            s.read_to(path, &mut buf)?;
            Ok(buf)
        })
    }

    /// Download a file to a local path. The local file is created (or
    /// truncated) per attempt, so a retried transfer starts clean.
    pub fn download(&self, path: &str, target: &Path) -> Result<u64, VfsError> {
        self.mount.with_session(|s| {
            let mut file = File::create(target)
                .map_err(|e| VfsError::Config(format!("cannot create {}: {e}", target.display())))?;
            let n = s.read_to(path, &mut file)?;
            file.flush()
                .map_err(|e| VfsError::from_io("download", path, &e))?;
            Ok(n)
        })
    }

    /// Write a byte slice to a remote file.
    pub fn write(&self, path: &str, data: &[u8], mode: WriteMode) -> Result<u64, VfsError> {
        self.mount.with_session(|s| {
            let mut source: &[u8] = data;
            s.write_from(path, &mut source, mode)
        })
    }

    /// Upload a local file to a remote path. The local file is reopened
    /// per attempt.
    pub fn upload(&self, source: &Path, path: &str, mode: WriteMode) -> Result<u64, VfsError> {
        self.mount.with_session(|s| {
            let mut file = File::open(source)
                .map_err(|e| VfsError::Config(format!("cannot open {}: {e}", source.display())))?;
            s.write_from(path, &mut file, mode)
        })
    }

    /// Stream a remote file into an arbitrary writer. Unlike
    /// [`download`](Self::download) the sink cannot be rewound, so a
    /// transient failure mid-stream propagates instead of being retried.
    pub fn read_into(&self, path: &str, sink: &mut dyn Write) -> Result<u64, VfsError> {
        let mut session = self.mount.borrow()?;
        let result = session.read_to(path, sink);
        match &result {
            Err(err) if err.is_transient() => {
                session.disconnect();
                drop(session);
            }
            _ => self.mount.give_back(session),
        }
        result
    }

    /// Create a directory.
    pub fn mkdir(&self, path: &str) -> Result<(), VfsError> {
        self.mount.with_session(|s| s.mkdir(path))
    }

    /// Delete an entry, dispatching on whether it is a directory.
    pub fn remove(&self, path: &str) -> Result<(), VfsError> {
        self.mount.with_session(|s| {
            let info = s.stat(path)?;
            if info.file_type.is_dir() {
                s.remove_dir(path)
            } else {
                s.remove_file(path)
            }
        })
    }

    /// Rename an entry within the mount.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), VfsError> {
        self.mount.with_session(|s| s.rename(from, to))
    }

    /// Capability set of the provider backing this mount.
    pub fn capabilities(&self) -> &'static [Capability] {
        self.mount.capabilities()
    }

    /// Whether the provider supports `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Close the mount. Idempotent and infallible; in-flight operations
    /// finish on their borrowed sessions, which are disconnected on
    /// return instead of being cached.
    pub fn close(&self) {
        self.mount.close();
    }

    /// Whether the mount has been closed.
    pub fn is_closed(&self) -> bool {
        self.mount.is_closed()
    }
}

/// Copy helper used by providers that expose raw streams.
///
/// Reads `source` to exhaustion in fixed-size chunks, writing each chunk
/// to `sink`; returns the byte count. Both ends stay synchronous.
pub fn copy_stream(
    op: &'static str,
    path: &str,
    source: &mut dyn Read,
    sink: &mut dyn Write,
) -> Result<u64, VfsError> {
    let mut chunk = [0u8; 32 * 1024];
    let mut total = 0u64;
    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(VfsError::from_io(op, path, &e)),
        };
        sink.write_all(&chunk[..n])
            .map_err(|e| VfsError::from_io(op, path, &e))?;
        total += n as u64;
    }
    Ok(total)
}

//! Protocol-agnostic core of the hawser remote file system.
//!
//! hawser exposes one facade over several remote storage protocols (FTP,
//! FTPS, SFTP, SMB2). This crate owns everything the protocols share:
//!
//! - [`IdleSlot`] — the single-slot cache holding the one idle session a
//!   mount may keep between operations;
//! - [`Mount`] — the borrow/return protocol over that slot, plus the
//!   one-way open → closed lifecycle;
//! - [`Mount::with_session`] — the retry wrapper that disconnects a
//!   stale session, reconnects, and re-runs the operation exactly once
//!   on transient transport failure;
//! - [`SessionFactory`] / [`ProviderSession`] — the capability surface a
//!   protocol provider implements;
//! - [`RemoteFs`] — the user-facing handle with typed file operations;
//! - [`VfsError`] — the error taxonomy the retry policy keys off.
//!
//! Wire protocols, authentication handshakes and listing formats are the
//! responsibility of the native client crates behind each provider
//! (`hawser-ftp`, `hawser-sftp`, `hawser-smb`).
//!
//! # Concurrency model
//!
//! There is no internal scheduler: every operation runs on its caller's
//! thread and all session I/O blocks. The only shared mutable state per
//! mount is the idle slot and the closed flag, both guarded by one lock
//! in [`IdleSlot`]. Sessions themselves are never shared — they move by
//! value between the slot and exactly one borrowing caller.
//!
//! # Example
//!
//! ```no_run
//! use hawser_core::{RemoteFs, SessionFactory};
//!
//! fn run(factory: Box<dyn SessionFactory>) -> Result<(), hawser_core::VfsError> {
//!     let fs = RemoteFs::open(factory)?;
//!     for entry in fs.list("/reports")? {
//!         println!("{}", entry.name);
//!     }
//!     fs.close();
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod fs;
mod identity;
mod mount;
mod options;
mod retry;
mod session;
mod slot;

pub mod path;
pub mod testing;

pub use error::{ProtocolKind, VfsError};
pub use fs::{RemoteFs, copy_stream};
pub use identity::{Credentials, MountIdentity};
pub use mount::Mount;
pub use options::MountOptions;
pub use session::{
    Capability, DirEntry, FileInfo, FileType, ProviderSession, SessionFactory, WriteMode,
};
pub use slot::IdleSlot;

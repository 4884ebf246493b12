//! SFTP provider for hawser.
//!
//! Sessions run over `russh` with the SFTP subsystem driven by
//! `russh-sftp`. The async stack is bridged to hawser's blocking session
//! capability through a single-thread tokio runtime owned by the session
//! factory — explicit per-mount state, not a process-wide static — so
//! callers see plain blocking I/O like every other provider.

#![forbid(unsafe_code)]

mod options;
mod session;

pub use options::{HostKeyPolicy, SftpMountOptions};
pub use session::SftpSessionFactory;

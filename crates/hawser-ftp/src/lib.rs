//! FTP and FTPS providers for hawser.
//!
//! Both schemes share one session type over `suppaftp`'s blocking client;
//! `ftps://` upgrades the control connection with explicit `AUTH TLS`
//! (via `native-tls`) before login. Transfers run in binary type; the
//! data connection defaults to passive mode.

#![forbid(unsafe_code)]

mod options;
mod session;

pub use options::{FtpMountOptions, FtpSecurity};
pub use session::FtpSessionFactory;

//! SMB2 provider for hawser.
//!
//! Sessions run over `pavao`, the Rust binding to libsmbclient, so this
//! crate links against the system Samba client library. It is not part
//! of the default build; the CLI enables it via the `smb` cargo feature.
//!
//! An `smb://host/share/path` mount binds one share; the first component
//! of the URL path names the share and the rest becomes the mount root
//! inside it.

#![forbid(unsafe_code)]

mod options;
mod session;

pub use options::SmbMountOptions;
pub use session::SmbSessionFactory;

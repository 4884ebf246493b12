//! SFTP-specific mount options.

use std::path::PathBuf;

use hawser_core::{MountOptions, VfsError};

/// How the server's host key is checked during the SSH handshake.
#[derive(Debug, Clone)]
pub enum HostKeyPolicy {
    /// Accept whatever key the server presents. Every accepted key is
    /// logged at warn level; suitable for trusted networks and tests
    /// only.
    AcceptAny,
    /// Verify against (and learn new hosts into) an OpenSSH
    /// `known_hosts` file.
    KnownHosts(PathBuf),
}

impl HostKeyPolicy {
    /// Known-hosts policy using `~/.ssh/known_hosts`.
    pub fn known_hosts_default() -> Result<Self, VfsError> {
        let home = dirs::home_dir()
            .ok_or_else(|| VfsError::Config("cannot determine home directory".into()))?;
        Ok(Self::KnownHosts(home.join(".ssh").join("known_hosts")))
    }
}

/// Options for an SFTP mount.
#[derive(Debug, Clone)]
pub struct SftpMountOptions {
    /// Protocol-agnostic options.
    pub mount: MountOptions,
    /// Host-key verification policy.
    pub host_key: HostKeyPolicy,
    /// Private key file for public-key authentication. When unset and no
    /// password is given, the usual `~/.ssh` key names are tried.
    pub key_file: Option<PathBuf>,
}

impl Default for SftpMountOptions {
    fn default() -> Self {
        Self {
            mount: MountOptions::default(),
            host_key: HostKeyPolicy::AcceptAny,
            key_file: None,
        }
    }
}

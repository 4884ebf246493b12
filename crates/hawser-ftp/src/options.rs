//! FTP-specific mount options.

use hawser_core::MountOptions;

/// Whether and how the control connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpSecurity {
    /// Plain FTP.
    None,
    /// Explicit FTPS: plain connect, then `AUTH TLS` upgrade before
    /// login.
    Explicit,
    /// Implicit FTPS (TLS from the first byte). Accepted in the options
    /// bag for completeness but rejected at factory construction; the
    /// deprecated implicit handshake is not supported.
    Implicit,
}

/// Options for an FTP or FTPS mount.
#[derive(Debug, Clone)]
pub struct FtpMountOptions {
    /// Protocol-agnostic options.
    pub mount: MountOptions,
    /// Use passive mode for data connections. Active mode rarely works
    /// through NAT; passive is the default.
    pub passive: bool,
    /// Control-connection security.
    pub security: FtpSecurity,
}

impl Default for FtpMountOptions {
    fn default() -> Self {
        Self {
            mount: MountOptions::default(),
            passive: true,
            security: FtpSecurity::None,
        }
    }
}

impl FtpMountOptions {
    /// Options for an explicit-TLS mount.
    pub fn secure() -> Self {
        Self {
            security: FtpSecurity::Explicit,
            ..Self::default()
        }
    }
}

//! SMB-specific mount options.

use hawser_core::MountOptions;

/// Options for an SMB2 mount.
#[derive(Debug, Clone, Default)]
pub struct SmbMountOptions {
    /// Protocol-agnostic options.
    pub mount: MountOptions,
    /// Workgroup used when the credentials carry no domain.
    pub workgroup: Option<String>,
}

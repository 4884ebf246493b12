//! Protocol-agnostic mount options.
//!
//! Provider crates embed [`MountOptions`] in their own option structs and
//! add whatever their session factory needs (passive mode, host-key
//! policy, workgroup). Options are plain values handed to the factory at
//! construction; there is no process-wide configuration state.

use std::time::Duration;

/// Options shared by every provider.
#[derive(Debug, Clone)]
pub struct MountOptions {
    /// Timeout for establishing the transport connection.
    pub connect_timeout: Duration,
    /// Read/write timeout applied to the transport where the native
    /// client supports one. `None` leaves the transport default.
    pub io_timeout: Option<Duration>,
    /// Create and authenticate the first session at mount-open so a bad
    /// endpoint or bad credentials fail fast. When `false` the first
    /// session is created at first use.
    pub eager_connect: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            io_timeout: None,
            eager_connect: true,
        }
    }
}

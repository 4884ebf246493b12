//! Process exit codes, BSD sysexits-flavoured.
//!
//! Categorization downcasts the typed error instead of matching message
//! text, so wording changes cannot break scripts.

use hawser_core::VfsError;

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;
pub const USAGE: u8 = 2;
pub const REMOTE_REJECTED: u8 = 66;
pub const UNAVAILABLE: u8 = 69;
pub const AUTH: u8 = 77;

pub fn categorize(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<VfsError>() {
        Some(VfsError::Auth { .. }) => AUTH,
        Some(VfsError::Connect { .. } | VfsError::Io { .. }) => UNAVAILABLE,
        Some(VfsError::Protocol { .. }) => REMOTE_REJECTED,
        Some(VfsError::Config(_)) => USAGE,
        Some(_) => FAILURE,
        None => FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vfs_errors_map_to_sysexits() {
        let auth: anyhow::Error = VfsError::Auth {
            user: "x".into(),
            endpoint: "h:21".into(),
        }
        .into();
        assert_eq!(categorize(&auth), AUTH);

        let missing: anyhow::Error = VfsError::not_found("/x").into();
        assert_eq!(categorize(&missing), REMOTE_REJECTED);

        let other = anyhow::anyhow!("something else");
        assert_eq!(categorize(&other), FAILURE);
    }
}

//! The retry-and-reconnect wrapper around one remote operation.
//!
//! Remote sessions go stale silently — idle timeouts, server restarts —
//! between borrow and use. One blind retry on a fresh session recovers
//! the large majority of those failures without masking genuine,
//! repeatable errors: auth rejections and protocol errors are never
//! retried, and a second transient failure propagates as-is.

use crate::error::VfsError;
use crate::mount::Mount;
use crate::session::ProviderSession;

impl Mount {
    /// Run `op` against a borrowed session, retrying exactly once on a
    /// transient transport failure.
    ///
    /// The session is returned to the mount afterwards unless it failed
    /// transiently, in which case it is disconnected and dropped. `op`
    /// must create any attempt-local state (buffers, local files) inside
    /// itself so a retry starts clean.
    ///
    /// A factory failure while borrowing the initial session propagates
    /// without retry; so does a factory failure while reconnecting.
    pub fn with_session<T, F>(&self, mut op: F) -> Result<T, VfsError>
    where
        F: FnMut(&mut dyn ProviderSession) -> Result<T, VfsError>,
    {
        let mut session = self.borrow()?;
        match op(session.as_mut()) {
            Ok(value) => {
                self.give_back(session);
                Ok(value)
            }
            Err(err) if err.is_transient() => {
                tracing::debug!(
                    scheme = self.factory.scheme(),
                    error = %err,
                    "transient failure, reconnecting for one retry"
                );
                session.disconnect();
                drop(session);

                let mut fresh = self.factory.create()?;
                match op(fresh.as_mut()) {
                    Ok(value) => {
                        self.give_back(fresh);
                        Ok(value)
                    }
                    Err(retry_err) => {
                        if retry_err.is_transient() {
                            fresh.disconnect();
                        } else {
                            // The reconnected session is healthy; the
                            // server just rejected the operation.
                            self.give_back(fresh);
                        }
                        Err(retry_err)
                    }
                }
            }
            Err(err) => {
                self.give_back(session);
                Err(err)
            }
        }
    }
}

//! Mount lifecycle: borrow/return over the idle slot, plus close.
//!
//! A [`Mount`] owns one [`SessionFactory`] and the single idle-session
//! slot for that remote root. File operations borrow a session, use it,
//! and give it back; the mount decides whether the returned session is
//! cached or disconnected. Closing is one-way and idempotent.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::VfsError;
use crate::session::{Capability, ProviderSession, SessionFactory};
use crate::slot::IdleSlot;

/// One mounted remote file system root.
pub struct Mount {
    pub(crate) factory: Box<dyn SessionFactory>,
    slot: IdleSlot<Box<dyn ProviderSession>>,
    closed: AtomicBool,
}

impl Mount {
    /// Mount without connecting; the first session is created at first
    /// borrow.
    pub fn open_lazy(factory: Box<dyn SessionFactory>) -> Self {
        Self {
            factory,
            slot: IdleSlot::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Mount and eagerly create the first session so a bad endpoint or
    /// bad credentials fail here rather than at first use. The session
    /// is parked in the idle slot.
    pub fn open(factory: Box<dyn SessionFactory>) -> Result<Self, VfsError> {
        let mount = Self::open_lazy(factory);
        let session = mount.factory.create()?;
        if let Err(mut rejected) = mount.slot.offer(session) {
            // Unreachable for a freshly built mount, but never leak.
            rejected.disconnect();
        }
        Ok(mount)
    }

    /// Borrow a session: the cached idle one when it is still alive,
    /// else a fresh one from the factory.
    ///
    /// After [`close`](Self::close) this still succeeds for in-flight
    /// callers — the sealed slot yields nothing, so they get a transient
    /// session that will be disconnected on return.
    pub fn borrow(&self) -> Result<Box<dyn ProviderSession>, VfsError> {
        if let Some(mut session) = self.slot.take() {
            if session.is_connected() {
                tracing::trace!(scheme = self.factory.scheme(), "reusing idle session");
                return Ok(session);
            }
            // The transport dropped while the session sat idle.
            tracing::debug!(
                scheme = self.factory.scheme(),
                "discarding stale idle session"
            );
            session.disconnect();
        }
        self.factory.create()
    }

    /// Return a borrowed session.
    ///
    /// An open mount caches it if the slot is free; otherwise — slot
    /// occupied, or mount closed — the session is disconnected here.
    pub fn give_back(&self, mut session: Box<dyn ProviderSession>) {
        if self.closed.load(Ordering::Acquire) {
            session.disconnect();
            return;
        }
        if let Err(mut rejected) = self.slot.offer(session) {
            tracing::trace!(
                scheme = self.factory.scheme(),
                "idle slot occupied, disconnecting surplus session"
            );
            rejected.disconnect();
        }
    }

    /// Close the mount: no session will be cached from now on, and the
    /// currently idle session (if any) is disconnected.
    ///
    /// Sealing the slot and draining it are one atomic step, so a
    /// `give_back` racing with close either lands before the seal (and
    /// is drained here) or is rejected and disconnected by the caller's
    /// thread. Idempotent, and never fails: disconnect errors are logged
    /// by the session and swallowed.
    pub fn close(&self) {
        let already = self.closed.swap(true, Ordering::AcqRel);
        if let Some(mut idle) = self.slot.seal() {
            idle.disconnect();
        }
        if !already {
            tracing::debug!(scheme = self.factory.scheme(), "mount closed");
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Capability set of the provider backing this mount.
    pub fn capabilities(&self) -> &'static [Capability] {
        self.factory.capabilities()
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("scheme", &self.factory.scheme())
            .field("closed", &self.is_closed())
            .field("idle", &self.slot.is_occupied())
            .finish()
    }
}

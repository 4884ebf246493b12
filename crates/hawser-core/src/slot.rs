//! Single-slot cache for the one idle session a mount may keep.
//!
//! The slot never blocks and never queues: `take` hands out the idle
//! session if there is one, `offer` stores a session only when the slot
//! is empty, and a rejected session is handed back to the caller to
//! disconnect. Both are single critical sections, so two racing offers
//! cannot both observe "empty" and silently leak one session.
//!
//! `seal` is the close-and-drain step: in one critical section it marks
//! the slot closed for inserts and removes whatever it held. After a
//! seal, every later `offer` is rejected — there is no window in which a
//! session can slip into a slot that close already drained.

use parking_lot::Mutex;

struct SlotState<S> {
    idle: Option<S>,
    sealed: bool,
}

/// Holder for at most one idle session.
pub struct IdleSlot<S> {
    state: Mutex<SlotState<S>>,
}

impl<S> IdleSlot<S> {
    /// An empty, unsealed slot.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                idle: None,
                sealed: false,
            }),
        }
    }

    /// Remove and return the idle session, if present. Never blocks on
    /// I/O and never creates; an empty slot simply yields `None`.
    pub fn take(&self) -> Option<S> {
        self.state.lock().idle.take()
    }

    /// Insert `session` if the slot is empty and not sealed.
    ///
    /// On rejection the session comes back in `Err` so the caller can
    /// disconnect it — the slot itself performs no I/O.
    pub fn offer(&self, session: S) -> Result<(), S> {
        let mut state = self.state.lock();
        if state.sealed || state.idle.is_some() {
            return Err(session);
        }
        state.idle = Some(session);
        Ok(())
    }

    /// Atomically close the slot for inserts and drain its content.
    /// Idempotent: a second seal returns `None`.
    pub fn seal(&self) -> Option<S> {
        let mut state = self.state.lock();
        state.sealed = true;
        state.idle.take()
    }

    /// Whether `seal` has been called.
    pub fn is_sealed(&self) -> bool {
        self.state.lock().sealed
    }

    /// Whether the slot currently holds an idle session.
    pub fn is_occupied(&self) -> bool {
        self.state.lock().idle.is_some()
    }
}

impl<S> Default for IdleSlot<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_empties_the_slot() {
        let slot = IdleSlot::new();
        assert!(slot.offer(1).is_ok());
        assert_eq!(slot.take(), Some(1));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn offer_rejects_when_occupied() {
        let slot = IdleSlot::new();
        assert!(slot.offer(1).is_ok());
        assert_eq!(slot.offer(2), Err(2));
        // The original occupant is untouched.
        assert_eq!(slot.take(), Some(1));
    }

    #[test]
    fn seal_drains_and_freezes() {
        let slot = IdleSlot::new();
        assert!(slot.offer(7).is_ok());
        assert_eq!(slot.seal(), Some(7));
        assert_eq!(slot.seal(), None);
        assert_eq!(slot.offer(8), Err(8));
        assert!(slot.is_sealed());
    }

    #[test]
    fn racing_offers_cache_exactly_one() {
        use std::sync::Arc;

        let slot = Arc::new(IdleSlot::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || slot.offer(i).is_ok())
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|accepted| *accepted)
            .count();
        assert_eq!(accepted, 1);
        assert!(slot.is_occupied());
    }
}

//! Last-relevant-response-wins guard for interleaved asynchronous loads.
//!
//! List surfaces issue a new load whenever filters change. Responses complete
//! in arbitrary order, so each outgoing load is tagged with a monotonically
//! increasing sequence number; a response is applied only while its ticket is
//! still the most recently issued one. Superseded responses are discarded,
//! never merged, which also keeps a failed newer load from being papered over
//! by an older success.

use std::sync::{PoisonError, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

/// A single load in flight. Obtained from [`ViewState::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
}

/// Shared view state guarded by a request sequence.
pub struct ViewState<T> {
    latest: AtomicU64,
    value: RwLock<Option<T>>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
            value: RwLock::new(None),
        }
    }

    /// Register a new outgoing load, superseding every ticket issued before.
    pub fn begin(&self) -> LoadTicket {
        let seq = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        LoadTicket { seq }
    }

    /// Whether the ticket still names the most recent load.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.seq
    }

    /// Install the response unless a newer load has been issued since the
    /// ticket was taken. Returns whether the value was installed.
    pub fn apply(&self, ticket: LoadTicket, value: T) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        *self
            .value
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(value);
        true
    }
}

impl<T: Clone> ViewState<T> {
    /// The most recently applied value, if any.
    pub fn current(&self) -> Option<T> {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_for_latest_ticket_is_applied() {
        let view = ViewState::new();
        let ticket = view.begin();
        assert!(view.apply(ticket, "first"));
        assert_eq!(view.current(), Some("first"));
    }

    #[test]
    fn superseded_response_is_discarded() {
        let view = ViewState::new();
        let stale = view.begin();
        let fresh = view.begin();

        // The newer load resolves first, then the stale one arrives.
        assert!(view.apply(fresh, "fresh"));
        assert!(!view.apply(stale, "stale"));
        assert_eq!(view.current(), Some("fresh"));
    }

    #[test]
    fn failed_newer_load_leaves_prior_state_visible() {
        let view = ViewState::new();
        let first = view.begin();
        assert!(view.apply(first, 1));

        // A newer load is issued but never applied (it failed); the old value
        // stays on screen and a late arrival for an even older ticket is still
        // rejected.
        let _failed = view.begin();
        assert!(!view.apply(first, 2));
        assert_eq!(view.current(), Some(1));
    }
}

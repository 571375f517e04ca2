//! Single-flight coordination for access-token refresh.
//!
//! `RefreshGate` holds the "refresh in flight" flag and the queue of
//! requests waiting for it. The first caller to report an expired token
//! becomes the leader and receives a [`RefreshLease`]. Callers that arrive
//! while the lease is held are queued. Settling the lease clears the flag
//! and hands back the queue in arrival order, so the leader can replay or
//! reject each entry exactly once.
//!
//! A lease dropped without being settled (the leader's future was
//! cancelled) still clears the flag but does not bump the generation. The
//! waiters it held are dropped, which closes their reply channels; they are
//! expected to go through admission again, and the first one back leads.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

struct GateState<W> {
    in_flight: bool,
    /// Bumped every time a refresh settles.
    generation: u64,
    pending: VecDeque<W>,
}

/// Outcome of asking the gate to recover from an authentication failure.
pub enum Admission<'a, W> {
    /// No refresh was running. The caller must perform it and settle the lease.
    Lead(RefreshLease<'a, W>, W),
    /// A refresh is running and the waiter has been queued behind it.
    Queued,
    /// A refresh settled after the caller's request was sent. The caller
    /// should replay with the current token instead of refreshing again.
    Stale(W),
}

pub struct RefreshGate<W> {
    state: Mutex<GateState<W>>,
}

impl<W> Default for RefreshGate<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> RefreshGate<W> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                in_flight: false,
                generation: 0,
                pending: VecDeque::new(),
            }),
        }
    }

    // Nothing in the critical sections can leave the state half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, GateState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of refreshes settled so far. Sample this before sending a request.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    /// Number of waiters queued behind the current refresh.
    pub fn queued(&self) -> usize {
        self.lock().pending.len()
    }

    /// Decide, atomically, whether the caller leads a refresh, waits for the
    /// one in flight, or simply retries because a refresh already happened.
    ///
    /// `seen_generation` is the value of [`generation`](Self::generation)
    /// observed before the failed request was sent.
    pub fn admit(&self, waiter: W, seen_generation: u64) -> Admission<'_, W> {
        let mut state = self.lock();
        if state.in_flight {
            state.pending.push_back(waiter);
            return Admission::Queued;
        }
        if state.generation != seen_generation {
            return Admission::Stale(waiter);
        }
        state.in_flight = true;
        drop(state);
        Admission::Lead(
            RefreshLease {
                gate: self,
                settled: false,
            },
            waiter,
        )
    }
}

/// Proof that the holder is the one caller currently refreshing.
pub struct RefreshLease<'a, W> {
    gate: &'a RefreshGate<W>,
    settled: bool,
}

impl<W> RefreshLease<'_, W> {
    /// Finish the refresh cycle. Returns every queued waiter, oldest first.
    pub fn settle(mut self) -> Vec<W> {
        self.settled = true;
        let mut state = self.gate.lock();
        state.in_flight = false;
        state.generation += 1;
        state.pending.drain(..).collect()
    }
}

impl<W> Drop for RefreshLease<'_, W> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let abandoned: Vec<W> = {
            let mut state = self.gate.lock();
            state.in_flight = false;
            state.pending.drain(..).collect()
        };
        warn!(waiters = abandoned.len(), "Token refresh abandoned before it settled, waiters will retry");
    }
}

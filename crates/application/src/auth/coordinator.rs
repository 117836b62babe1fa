//! Single-flight refresh coordination.
//!
//! Any number of requests can discover an expired access token at the same
//! time; exactly one of them may perform the token exchange. The first
//! caller through [`RefreshCoordinator::begin`] becomes the *leader* and
//! runs the exchange; everyone else gets a [`RefreshWaiter`] that suspends
//! until the leader calls [`RefreshCoordinator::settle`]. Waiters are
//! released in the order they enqueued.
//!
//! The coordinator holds no credential state and never performs I/O itself;
//! it only transports the exchange outcome. Persisting (or purging) the
//! credential is the request client's job.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

use atrium_domain::AuthError;

/// Outcome of one refresh exchange: the new access token, or the error
/// every queued waiter is rejected with.
pub type RefreshOutcome = Result<String, AuthError>;

#[derive(Debug, Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Coordinates concurrent refresh attempts into a single exchange.
///
/// Constructed once at client-setup time and reused for every refresh
/// cycle; tests instantiate isolated coordinators freely.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// What a caller holds after announcing an expired-token discovery.
#[derive(Debug)]
pub enum RefreshTicket {
    /// No exchange was in flight; the caller must perform it and then
    /// call [`RefreshCoordinator::settle`] with the outcome.
    Leader,
    /// An exchange is already in flight; await the shared outcome.
    Waiter(RefreshWaiter),
}

/// A suspended caller awaiting the in-flight exchange.
#[derive(Debug)]
pub struct RefreshWaiter {
    rx: oneshot::Receiver<RefreshOutcome>,
}

impl RefreshWaiter {
    /// Wait for the in-flight exchange to settle.
    ///
    /// If the coordinator is dropped before settling, the waiter observes
    /// [`AuthError::Interrupted`].
    pub async fn outcome(self) -> RefreshOutcome {
        self.rx.await.unwrap_or(Err(AuthError::Interrupted))
    }
}

impl RefreshCoordinator {
    /// Create an idle coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce an expired-token discovery.
    ///
    /// The flag check and set happen under one lock acquisition with no
    /// await point in between, so two callers can never both observe the
    /// idle state.
    pub fn begin(&self) -> RefreshTicket {
        let mut state = self.lock_state();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            RefreshTicket::Waiter(RefreshWaiter { rx })
        } else {
            state.in_flight = true;
            RefreshTicket::Leader
        }
    }

    /// Settle the in-flight exchange, releasing every queued waiter in
    /// FIFO order with a clone of the outcome.
    ///
    /// A settle with no queued waiters is a no-op apart from returning the
    /// coordinator to idle. Waiters whose receiving side has gone away are
    /// skipped.
    pub fn settle(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.lock_state();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
    }

    /// Whether an exchange is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().in_flight
    }

    /// Number of callers queued behind the in-flight exchange.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.lock_state().waiters.len()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/*!
 * Shutdown Token
 *
 * Process-scoped cancellation token built on parking_lot::Condvar
 */

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct TokenState {
    requested: Mutex<bool>,
    condvar: Condvar,
}

/// Single-shot shutdown request shared by cloning
///
/// Hand a clone to every component that may ask for shutdown (a signal
/// callback, a worker pool) instead of reaching through global state.
/// Once requested, the token stays requested.
#[derive(Clone)]
pub struct ShutdownToken {
    state: Arc<TokenState>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self {
            state: Arc::new(TokenState {
                requested: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        }
    }

    /// Request shutdown and wake every waiter
    ///
    /// Returns `true` for the call that flipped the token.
    pub fn request(&self) -> bool {
        let mut requested = self.state.requested.lock();
        if *requested {
            return false;
        }
        *requested = true;
        drop(requested);

        let woken = self.state.condvar.notify_all();
        debug!(woken, "Shutdown requested");
        true
    }

    pub fn is_requested(&self) -> bool {
        *self.state.requested.lock()
    }

    /// Block until shutdown is requested
    pub fn wait(&self) {
        let mut requested = self.state.requested.lock();
        while !*requested {
            self.state.condvar.wait(&mut requested);
        }
    }

    /// Block until shutdown is requested or `timeout` elapses
    ///
    /// Returns whether shutdown was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut requested = self.state.requested.lock();
        while !*requested {
            if self
                .state
                .condvar
                .wait_until(&mut requested, deadline)
                .timed_out()
            {
                break;
            }
        }
        *requested
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ShutdownToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownToken")
            .field("requested", &self.is_requested())
            .finish()
    }
}

//! Cancellation and wall-clock budgets for long-running work

use crate::{Error, Result};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Flag {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared flag used to stop training runs and replay streams
///
/// Clones share the same flag. Cancelling wakes every thread blocked in
/// [`CancellationToken::wait_timeout`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Flag>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cancelled = true;
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sleep for up to `timeout`, returning early if cancelled
    ///
    /// Returns `true` if the token was cancelled before or during the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .inner
                .wake
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            cancelled = guard;
        }
        true
    }
}

/// Cancellation token plus an optional wall-clock limit for one run
#[derive(Debug, Clone)]
pub struct RunBudget {
    token: CancellationToken,
    limit: Option<Duration>,
    started: Instant,
}

impl Default for RunBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl RunBudget {
    /// No limit and a fresh, never-cancelled token
    pub fn unlimited() -> Self {
        Self {
            token: CancellationToken::new(),
            limit: None,
            started: Instant::now(),
        }
    }

    /// Budget observing an existing token
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::unlimited()
        }
    }

    /// Add a wall-clock limit counted from now
    pub fn limit(mut self, limit: Duration) -> Self {
        self.limit = Some(limit);
        self.started = Instant::now();
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail if the run was cancelled or ran out of time
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(limit) = self.limit {
            if self.started.elapsed() > limit {
                return Err(Error::TimedOut { limit });
            }
        }
        Ok(())
    }
}

//! Per-call deadline and cancellation.
//!
//! # Design
//! A `Context` travels with a single request and is never stored on the
//! client, so concurrent calls through one shared client each keep their own
//! bound. Narrowing a context only ever moves its deadline earlier.
//!
//! Cancellation uses `tokio_util`'s `CancellationToken`, so async callers can
//! share one token with blocking requests. Blocking code waits on a token
//! through [`block_until`], which drives `cancelled()` on a throwaway
//! current-thread runtime. Waiting must therefore not happen inside an async
//! runtime.

use std::io;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::TransportError;

/// Stand-in for deadlines `Instant` cannot represent. Roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + timeout`, saturating instead of overflowing.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Block the current thread until `token` is cancelled or `deadline` passes.
///
/// Returns at once when there is neither a token nor a deadline.
pub(crate) fn block_until(
    token: Option<&CancellationToken>,
    deadline: Option<Instant>,
) -> io::Result<()> {
    let Some(token) = token else {
        if let Some(deadline) = deadline {
            std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        }
        return Ok(());
    };
    if token.is_cancelled() {
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(async {
        match deadline {
            Some(deadline) => {
                let _ = tokio::time::timeout_at(deadline.into(), token.cancelled()).await;
            }
            None => token.cancelled().await,
        }
    });
    Ok(())
}

/// Deadline and cancellation bound for one request.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    token: Option<CancellationToken>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrow the deadline. The earlier of the existing and new deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Narrow the deadline to `timeout` from now. A timeout too large for
    /// `Instant` becomes a deadline decades away.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(deadline_after(timeout))
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether anything can end this context.
    pub fn is_bounded(&self) -> bool {
        self.deadline.is_some() || self.token.is_some()
    }

    /// Why the context has ended, if it has. Cancellation wins over an
    /// expired deadline.
    pub fn err(&self) -> Option<TransportError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(TransportError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(TransportError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Block until the context ends and return why.
    ///
    /// Returns `None` immediately when the context is unbounded, since
    /// nothing could ever end it.
    pub fn wait(&self) -> Option<TransportError> {
        if !self.is_bounded() {
            return None;
        }
        loop {
            if let Err(err) = block_until(self.token.as_ref(), self.deadline) {
                return Some(TransportError::transport(err));
            }
            if let Some(err) = self.err() {
                return Some(err);
            }
        }
    }

    /// Block for at most `timeout`. Returns `Some` if the context ended first.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<TransportError> {
        let limit = deadline_after(timeout);
        let wake = match self.deadline {
            Some(deadline) => deadline.min(limit),
            None => limit,
        };
        if let Err(err) = block_until(self.token.as_ref(), Some(wake)) {
            return Some(TransportError::transport(err));
        }
        self.err()
    }
}

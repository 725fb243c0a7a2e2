use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared cancellation flag for a tick clock.
///
/// Clones observe the same flag; cancelling any handle suspends every clock
/// holding it. Cancellation is permanent.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fixed-period tick clock driven by the consumer's own draw loop.
///
/// The renderer polls from its paint boundary; [`TickClock::poll`] reports
/// `true` when at least one period elapsed since the last fire. Missed periods
/// are coalesced into a single fire and the clock re-anchors, so a stalled
/// consumer never replays a backlog of ticks.
pub struct TickClock {
    period: Duration,
    next_due: Instant,
    token: CancellationToken,
}

impl TickClock {
    pub fn new(period: Duration) -> Self {
        Self::with_token(period, CancellationToken::new())
    }

    pub fn with_token(period: Duration, token: CancellationToken) -> Self {
        Self {
            period,
            next_due: Instant::now() + period,
            token,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Handle that suspends this clock when cancelled.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Report whether a tick is due at `now`, firing at most once per call.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.token.is_cancelled() || now < self.next_due {
            return false;
        }
        // Re-anchor instead of accumulating missed periods.
        self.next_due = now + self.period;
        true
    }
}

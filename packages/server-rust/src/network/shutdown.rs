//! Serving lifecycle with in-flight request tracking.
//!
//! The current [`ServingState`] lives in an `ArcSwap` so readiness probes
//! read it without locking. In-flight requests are counted by RAII guards
//! handed out per request by the HTTP middleware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

/// Where the server is in its lifecycle.
///
/// Transitions: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServingState {
    /// Store is being connected, listener not yet serving.
    Starting,
    /// Serving requests.
    Ready,
    /// Shutdown signalled; waiting for in-flight requests.
    Draining,
    /// All in-flight requests finished.
    Stopped,
}

impl ServingState {
    /// Lowercase label for logs and probe bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

/// Tracks the serving state and the number of requests currently executing.
#[derive(Debug)]
pub struct Lifecycle {
    state: ArcSwap<ServingState>,
    in_flight: Arc<AtomicU64>,
}

impl Lifecycle {
    /// Creates a lifecycle in the `Starting` state with no requests in flight.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(ServingState::Starting),
            in_flight: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current serving state.
    #[must_use]
    pub fn state(&self) -> ServingState {
        **self.state.load()
    }

    /// Marks the server as accepting traffic.
    pub fn set_ready(&self) {
        self.state.store(Arc::new(ServingState::Ready));
    }

    /// Marks the server as draining. Readiness probes fail from here on.
    pub fn begin_drain(&self) {
        self.state.store(Arc::new(ServingState::Draining));
    }

    /// Counts a request as in flight until the returned guard is dropped.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Number of requests currently holding a guard.
    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Waits until no request is in flight or `timeout` elapses.
    ///
    /// On success the state becomes `Stopped` and `true` is returned.
    /// On timeout the state is left unchanged and `false` is returned.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        while self.in_flight_count() > 0 {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.state.store(Arc::new(ServingState::Stopped));
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter on drop, including during unwinding.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_starting_state() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), ServingState::Starting);
        assert_eq!(lifecycle.in_flight_count(), 0);
    }

    #[test]
    fn transitions_ready_then_draining() {
        let lifecycle = Lifecycle::new();
        lifecycle.set_ready();
        assert_eq!(lifecycle.state(), ServingState::Ready);
        lifecycle.begin_drain();
        assert_eq!(lifecycle.state(), ServingState::Draining);
    }

    #[test]
    fn state_labels() {
        assert_eq!(ServingState::Starting.as_str(), "starting");
        assert_eq!(ServingState::Ready.as_str(), "ready");
        assert_eq!(ServingState::Draining.as_str(), "draining");
        assert_eq!(ServingState::Stopped.as_str(), "stopped");
    }

    #[test]
    fn guards_count_in_flight_requests() {
        let lifecycle = Lifecycle::new();
        let a = lifecycle.in_flight_guard();
        let b = lifecycle.in_flight_guard();
        assert_eq!(lifecycle.in_flight_count(), 2);
        drop(a);
        assert_eq!(lifecycle.in_flight_count(), 1);
        drop(b);
        assert_eq!(lifecycle.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn drain_with_nothing_in_flight_stops_immediately() {
        let lifecycle = Lifecycle::new();
        lifecycle.set_ready();
        lifecycle.begin_drain();

        assert!(lifecycle.wait_for_drain(Duration::from_secs(1)).await);
        assert_eq!(lifecycle.state(), ServingState::Stopped);
    }

    #[tokio::test]
    async fn drain_waits_for_guard_release() {
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.set_ready();
        let guard = lifecycle.in_flight_guard();
        lifecycle.begin_drain();

        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        assert!(lifecycle.wait_for_drain(Duration::from_secs(2)).await);
        assert_eq!(lifecycle.state(), ServingState::Stopped);
        release.await.unwrap();
    }

    #[tokio::test]
    async fn drain_times_out_with_request_stuck() {
        let lifecycle = Lifecycle::new();
        lifecycle.set_ready();
        let _guard = lifecycle.in_flight_guard();
        lifecycle.begin_drain();

        assert!(!lifecycle.wait_for_drain(Duration::from_millis(50)).await);
        assert_eq!(lifecycle.state(), ServingState::Draining);
    }
}

// Load session: outcome ledger, payload cache and the ready/complete lifecycle.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::PayloadCache;
use super::outcome::LoadOutcome;
use super::stats::{StatsCollector, StatsSnapshot};

/// Session lifecycle. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Idle,
    Loading,
    CriticalSettled,
    /// High tier settled; the session is usable.
    Ready,
    /// Medium/low tiers still in flight.
    Background,
    /// Every tier settled.
    Complete,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::CriticalSettled => "critical-settled",
            SessionState::Ready => "ready",
            SessionState::Background => "background",
            SessionState::Complete => "complete",
        };
        write!(f, "{}", name)
    }
}

#[derive(Default)]
struct Ledger {
    outcomes: Vec<LoadOutcome>,
    settled: HashSet<String>,
}

#[derive(Default)]
struct Timestamps {
    ready_at: Option<Instant>,
    finished_at: Option<Instant>,
}

pub struct LoadSession {
    pub session_id: u64,
    started_at: Instant,
    expected: usize,
    ledger: Mutex<Ledger>,
    times: Mutex<Timestamps>,
    cache: PayloadCache,
    stats: StatsCollector,
    state: watch::Sender<SessionState>,
    cancel: CancellationToken,
}

impl LoadSession {
    pub fn new(session_id: u64, expected: usize, started_at: Instant) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            session_id,
            started_at,
            expected,
            ledger: Mutex::new(Ledger::default()),
            times: Mutex::new(Timestamps::default()),
            cache: PayloadCache::new(),
            stats: StatsCollector::new(),
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// Record the single outcome for a resource. A second outcome for the same id is dropped.
    pub fn record(&self, outcome: LoadOutcome) -> bool {
        let mut ledger = self.ledger.lock();
        if !ledger.settled.insert(outcome.resource_id.clone()) {
            warn!(
                "session {} dropped duplicate outcome for {}",
                self.session_id, outcome.resource_id
            );
            return false;
        }
        if let Some(payload) = &outcome.payload {
            self.cache.put(&outcome.resource_id, payload.clone());
        }
        self.stats.record_outcome(&outcome);
        debug!(
            "session {} recorded {} = {} ({}/{})",
            self.session_id,
            outcome.resource_id,
            outcome.status,
            ledger.outcomes.len() + 1,
            self.expected
        );
        ledger.outcomes.push(outcome);
        true
    }

    pub fn has_outcome(&self, resource_id: &str) -> bool {
        self.ledger.lock().settled.contains(resource_id)
    }

    /// Move the lifecycle forward. Backward transitions are ignored.
    pub fn advance(&self, next: SessionState, at: Instant) -> bool {
        let moved = self.state.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if !moved {
            return false;
        }

        let mut times = self.times.lock();
        if next >= SessionState::Ready && times.ready_at.is_none() {
            times.ready_at = Some(at);
            info!(
                "session {} ready after {}ms",
                self.session_id,
                at.duration_since(self.started_at).as_millis()
            );
        }
        if next == SessionState::Complete {
            times.finished_at = Some(at);
            info!(
                "session {} complete after {}ms, {} failure(s)",
                self.session_id,
                at.duration_since(self.started_at).as_millis(),
                self.failures().len()
            );
        }
        true
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait until the lifecycle reaches `target` (or passes it).
    pub async fn wait_for(&self, target: SessionState) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|s| *s >= target).await;
    }

    pub async fn ready(&self) {
        self.wait_for(SessionState::Ready).await;
    }

    pub async fn complete(&self) {
        self.wait_for(SessionState::Complete).await;
    }

    pub fn is_ready(&self) -> bool {
        self.state() >= SessionState::Ready
    }

    pub fn is_complete(&self) -> bool {
        self.state() == SessionState::Complete
    }

    pub fn outcomes(&self) -> Vec<LoadOutcome> {
        self.ledger.lock().outcomes.clone()
    }

    pub fn outcome(&self, resource_id: &str) -> Option<LoadOutcome> {
        self.ledger
            .lock()
            .outcomes
            .iter()
            .find(|o| o.resource_id == resource_id)
            .cloned()
    }

    /// Failed and timed-out outcomes, in settlement order.
    pub fn failures(&self) -> Vec<LoadOutcome> {
        self.ledger
            .lock()
            .outcomes
            .iter()
            .filter(|o| o.is_failure())
            .cloned()
            .collect()
    }

    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn collector(&self) -> &StatsCollector {
        &self.stats
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Abort every in-flight load of this session.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn ready_at(&self) -> Option<Instant> {
        self.times.lock().ready_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.times.lock().finished_at
    }

    /// Time from start to completion, if complete.
    pub fn load_time(&self) -> Option<Duration> {
        self.finished_at()
            .map(|end| end.duration_since(self.started_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::catalog::{Priority, ResourceDescriptor, ResourceKind};
    use crate::engine::error::LoadError;
    use crate::engine::outcome::Payload;

    fn descriptor(id: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(id, format!("https://x/{}", id), ResourceKind::Font, Priority::High)
    }

    #[test]
    fn test_duplicate_outcome_dropped() {
        let session = LoadSession::new(1, 1, Instant::now());
        let d = descriptor("a");
        assert!(session.record(LoadOutcome::success(&d, Payload::Empty, Duration::ZERO)));
        assert!(!session.record(LoadOutcome::failure(&d, &LoadError::Timeout, Duration::ZERO)));

        let outcomes = session.outcomes();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
        assert_eq!(session.cache().get("a"), Some(Payload::Empty));
        assert!(session.failures().is_empty());
    }

    #[test]
    fn test_state_only_moves_forward() {
        let now = Instant::now();
        let session = LoadSession::new(1, 0, now);
        assert!(session.advance(SessionState::Ready, now));
        assert!(!session.advance(SessionState::Loading, now));
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.ready_at().is_some());
        assert!(session.finished_at().is_none());

        assert!(session.advance(SessionState::Complete, now));
        assert!(session.is_complete());
        assert_eq!(session.load_time(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_ready_resolves_before_complete() {
        let session = Arc::new(LoadSession::new(1, 0, Instant::now()));
        let waiter = {
            let session = session.clone();
            tokio::spawn(async move { session.ready().await })
        };
        session.advance(SessionState::Loading, Instant::now());
        session.advance(SessionState::Ready, Instant::now());
        waiter.await.unwrap();
        assert!(!session.is_complete());
    }
}

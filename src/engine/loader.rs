// Priority loader: critical then high are awaited tier by tier, medium and low run in the background.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::error::LoadError;
use super::outcome::LoadOutcome;
use super::race::TimeoutRace;
use super::session::{LoadSession, SessionState};
use crate::catalog::{Priority, ResourceCatalog, ResourceDescriptor};
use crate::host::traits::Clock;

/// Result of asking the loader for a session.
pub enum Claim {
    /// A new session was created; the caller must drive it.
    Fresh(Arc<LoadSession>),
    /// A session is already in progress.
    Existing(Arc<LoadSession>),
}

pub struct PriorityLoader {
    race: Arc<TimeoutRace>,
    clock: Arc<dyn Clock>,
    active: Mutex<Option<Arc<LoadSession>>>,
    next_session_id: AtomicU64,
}

impl PriorityLoader {
    pub fn new(race: Arc<TimeoutRace>, clock: Arc<dyn Clock>) -> Self {
        Self {
            race,
            clock,
            active: Mutex::new(None),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Load the catalog. Returns once the session is ready (high tier settled).
    ///
    /// If a session is still in progress, logs a warning and returns it unchanged.
    pub async fn run(&self, catalog: &ResourceCatalog) -> Arc<LoadSession> {
        match self.claim(catalog) {
            Claim::Existing(session) => session,
            Claim::Fresh(session) => {
                self.drive(session.clone(), catalog).await;
                session
            }
        }
    }

    /// Reserve the single active slot. Does not start loading.
    pub fn claim(&self, catalog: &ResourceCatalog) -> Claim {
        let mut active = self.active.lock();
        if let Some(existing) = active.as_ref() {
            if !existing.is_complete() {
                warn!(
                    "preload session {} already in progress ({}), ignoring start",
                    existing.session_id,
                    existing.state()
                );
                return Claim::Existing(existing.clone());
            }
        }

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(LoadSession::new(
            session_id,
            catalog.len(),
            self.clock.now(),
        ));
        *active = Some(session.clone());
        Claim::Fresh(session)
    }

    /// Launch the tiers of a claimed session and wait until it is ready.
    ///
    /// Loading runs on its own task, so dropping this future does not stall the session.
    pub async fn drive(&self, session: Arc<LoadSession>, catalog: &ResourceCatalog) {
        tokio::spawn(drive_tiers(
            self.race.clone(),
            self.clock.clone(),
            session.clone(),
            catalog.partition(),
        ));
        session.ready().await;
    }

    pub fn active_session(&self) -> Option<Arc<LoadSession>> {
        self.active.lock().clone()
    }

    /// Cancel and forget the current session.
    pub fn reset(&self) -> Option<Arc<LoadSession>> {
        let session = self.active.lock().take();
        if let Some(session) = &session {
            session.cancel();
        }
        session
    }
}

/// Critical and high tier in sequence, then medium and low together, then complete.
async fn drive_tiers(
    race: Arc<TimeoutRace>,
    clock: Arc<dyn Clock>,
    session: Arc<LoadSession>,
    tiers: Vec<(Priority, Vec<ResourceDescriptor>)>,
) {
    session.advance(SessionState::Loading, clock.now());

    let mut blocking = Vec::new();
    let mut background = Vec::new();
    for (priority, members) in tiers {
        if priority.is_background() {
            background.push((priority, members));
        } else {
            blocking.push((priority, members));
        }
    }
    let tier_len = |tiers: &[(Priority, Vec<ResourceDescriptor>)], p: Priority| {
        tiers
            .iter()
            .filter(|(priority, _)| *priority == p)
            .map(|(_, m)| m.len())
            .sum::<usize>()
    };
    info!(
        "session {} starting: critical={} high={} background={}",
        session.session_id,
        tier_len(&blocking, Priority::Critical),
        tier_len(&blocking, Priority::High),
        background.iter().map(|(_, m)| m.len()).sum::<usize>()
    );

    for (priority, members) in blocking {
        load_tier(race.clone(), session.clone(), priority, members).await;
        if priority == Priority::Critical {
            session.advance(SessionState::CriticalSettled, clock.now());
        }
    }
    session.advance(SessionState::Ready, clock.now());

    if background.iter().all(|(_, members)| members.is_empty()) {
        session.advance(SessionState::Complete, clock.now());
        return;
    }

    session.advance(SessionState::Background, clock.now());
    let mut set = JoinSet::new();
    for (priority, members) in background {
        set.spawn(load_tier(race.clone(), session.clone(), priority, members));
    }
    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            warn!("background tier task failed: {}", e);
        }
    }
    session.advance(SessionState::Complete, clock.now());
}

/// Load every member of one tier concurrently. Resolves once each member has an outcome.
async fn load_tier(
    race: Arc<TimeoutRace>,
    session: Arc<LoadSession>,
    priority: Priority,
    members: Vec<ResourceDescriptor>,
) {
    if members.is_empty() {
        return;
    }
    info!(
        "session {} loading {} tier ({} resources)",
        session.session_id,
        priority,
        members.len()
    );

    let mut set = JoinSet::new();
    for descriptor in members.iter().cloned() {
        let race = race.clone();
        let session = session.clone();
        set.spawn(async move {
            session.collector().increment_in_flight();
            let outcome = race
                .load_with_cancel(&descriptor, session.cancel_token())
                .await;
            session.collector().decrement_in_flight();
            session.record(outcome);
        });
    }

    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            warn!("{} tier load task failed: {}", priority, e);
        }
    }

    // A member whose task panicked still gets exactly one outcome.
    for descriptor in &members {
        if !session.has_outcome(&descriptor.id) {
            let error = LoadError::TaskAborted("load task did not finish".to_string());
            session.collector().decrement_in_flight();
            session.record(LoadOutcome::failure(
                descriptor,
                &error,
                std::time::Duration::ZERO,
            ));
        }
    }
    debug!("session {} {} tier settled", session.session_id, priority);
}

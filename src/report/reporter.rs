use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::notice::Notice;
use crate::config::PreloadConfig;
use crate::engine::session::LoadSession;
use crate::host::traits::{Clock, NoticeAction, NoticePhase, NoticeSurface};

/// Document id of the failure notice; at most one is mounted at a time.
pub const NOTICE_ID: &str = "preload-failure-notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    CloseButton,
    Backdrop,
    Expired,
    /// `NoticeHandle::dismiss` was called.
    Requested,
    /// The host detached the notice on its own.
    Detached,
}

/// External handle to a mounted notice.
#[derive(Clone)]
pub struct NoticeHandle {
    dismiss: CancellationToken,
    closed: watch::Receiver<Option<DismissReason>>,
}

impl NoticeHandle {
    pub fn dismiss(&self) {
        self.dismiss.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.borrow().is_some()
    }

    /// Wait until the notice is gone from the document.
    pub async fn closed(&self) -> DismissReason {
        let mut rx = self.closed.clone();
        let reason = match rx.wait_for(|r| r.is_some()).await {
            Ok(reason) => (*reason).unwrap_or(DismissReason::Detached),
            Err(_) => DismissReason::Detached,
        };
        reason
    }
}

pub struct FailureReporter {
    surface: Arc<dyn NoticeSurface>,
    clock: Arc<dyn Clock>,
    auto_dismiss: Duration,
    remove_delay: Duration,
    current: Mutex<Option<NoticeHandle>>,
}

impl FailureReporter {
    pub fn new(surface: Arc<dyn NoticeSurface>, clock: Arc<dyn Clock>, config: &PreloadConfig) -> Self {
        Self {
            surface,
            clock,
            auto_dismiss: config.notice_auto_dismiss(),
            remove_delay: config.notice_remove_delay(),
            current: Mutex::new(None),
        }
    }

    /// Mount the failure notice if the session has failures and none is visible yet.
    ///
    /// Must be called from within a tokio runtime: dismissal runs on a spawned task.
    pub fn report_if_needed(&self, session: &LoadSession) -> Option<NoticeHandle> {
        let failures = session.failures();
        if failures.is_empty() {
            debug!("session {} had no failures, no notice", session.session_id);
            return None;
        }
        let mut current = self.current.lock();
        if self.surface.is_mounted(NOTICE_ID) {
            debug!("failure notice already visible");
            return None;
        }

        let notice = Notice::from_outcomes(NOTICE_ID, &failures);
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        self.surface.mount(&notice, actions_tx);
        self.surface.set_phase(NOTICE_ID, NoticePhase::Shown);
        info!(
            "showing failure notice for {} resource(s): {}",
            notice.entries.len(),
            notice
                .entries
                .iter()
                .map(|e| e.resource_id.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );

        let dismiss = CancellationToken::new();
        let (closed_tx, closed_rx) = watch::channel(None);
        let handle = NoticeHandle {
            dismiss: dismiss.clone(),
            closed: closed_rx,
        };

        let surface = self.surface.clone();
        let clock = self.clock.clone();
        let auto_dismiss = self.auto_dismiss;
        let remove_delay = self.remove_delay;
        tokio::spawn(async move {
            let reason =
                wait_for_dismissal(clock.as_ref(), actions_rx, &dismiss, auto_dismiss).await;
            if reason != DismissReason::Detached {
                hide_notice(surface.as_ref(), clock.as_ref(), remove_delay).await;
            }
            info!("failure notice dismissed ({:?})", reason);
            let _ = closed_tx.send(Some(reason));
        });

        *current = Some(handle.clone());
        Some(handle)
    }

    pub fn current(&self) -> Option<NoticeHandle> {
        self.current.lock().clone()
    }

    /// Detach the notice immediately, skipping the hide transition.
    pub fn clear(&self) {
        if let Some(handle) = self.current.lock().take() {
            handle.dismiss();
        }
        if self.surface.is_mounted(NOTICE_ID) {
            self.surface.remove(NOTICE_ID);
        }
    }
}

async fn wait_for_dismissal(
    clock: &dyn Clock,
    mut actions: mpsc::UnboundedReceiver<NoticeAction>,
    dismiss: &CancellationToken,
    auto_dismiss: Duration,
) -> DismissReason {
    let mut expiry = clock.sleep(auto_dismiss);
    loop {
        // `clear` cancels and detaches together; the explicit request must win.
        tokio::select! {
            biased;
            _ = dismiss.cancelled() => return DismissReason::Requested,
            action = actions.recv() => match action {
                Some(NoticeAction::Close) => return DismissReason::CloseButton,
                Some(NoticeAction::Click { on_backdrop: true }) => return DismissReason::Backdrop,
                Some(NoticeAction::Click { on_backdrop: false }) => continue,
                None => return DismissReason::Detached,
            },
            _ = &mut expiry => return DismissReason::Expired,
        }
    }
}

/// Two-phase removal: mark hidden, then detach after the grace delay.
async fn hide_notice(surface: &dyn NoticeSurface, clock: &dyn Clock, remove_delay: Duration) {
    if !surface.is_mounted(NOTICE_ID) {
        return;
    }
    surface.set_phase(NOTICE_ID, NoticePhase::Hidden);
    clock.sleep(remove_delay).await;
    if surface.is_mounted(NOTICE_ID) {
        surface.remove(NOTICE_ID);
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::catalog::{ResourceCatalog, ResourceKind};
use crate::config::PreloadConfig;
use crate::engine::loader::{Claim, PriorityLoader};
use crate::engine::race::TimeoutRace;
use crate::engine::session::LoadSession;
use crate::engine::stats::StatsSnapshot;
use crate::host::traits::Host;
use crate::report::reporter::{FailureReporter, NoticeHandle};

/// A resource that failed or timed out, as reported by `Preloader::status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResource {
    pub id: String,
    pub url: String,
    pub kind: ResourceKind,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PreloadStatus {
    pub is_loading: bool,
    pub is_ready: bool,
    pub is_complete: bool,
    pub failed_count: usize,
    pub failed_resources: Vec<FailedResource>,
    pub load_time: Option<Duration>,
    pub stats: Option<StatsSnapshot>,
}

/// Composition root: one catalog, one loader, one failure reporter over an injected host.
pub struct Preloader {
    catalog: ResourceCatalog,
    loader: Arc<PriorityLoader>,
    reporter: Arc<FailureReporter>,
}

impl Preloader {
    pub fn new(config: PreloadConfig, catalog: ResourceCatalog, host: Host) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let race = Arc::new(TimeoutRace::new(config.clone(), host.clone()));
        let loader = Arc::new(PriorityLoader::new(race, host.clock.clone()));
        let reporter = Arc::new(FailureReporter::new(
            host.notices.clone(),
            host.clock.clone(),
            &config,
        ));
        info!(
            "preloader created: {} resources, deadline {}ms",
            catalog.len(),
            config.deadline_ms
        );
        Ok(Self {
            catalog,
            loader,
            reporter,
        })
    }

    /// Start a session and wait until it is ready.
    ///
    /// While a session is in progress this is a no-op that returns that session.
    /// The failure notice is rendered once every tier has settled.
    pub async fn start(&self) -> Arc<LoadSession> {
        match self.loader.claim(&self.catalog) {
            Claim::Existing(session) => session,
            Claim::Fresh(session) => {
                let reporter = self.reporter.clone();
                let watched = session.clone();
                tokio::spawn(async move {
                    watched.complete().await;
                    if watched.cancel_token().is_cancelled() {
                        debug!("session {} destroyed, skipping report", watched.session_id);
                        return;
                    }
                    reporter.report_if_needed(&watched);
                });

                self.loader.drive(session.clone(), &self.catalog).await;
                session
            }
        }
    }

    pub fn session(&self) -> Option<Arc<LoadSession>> {
        self.loader.active_session()
    }

    pub fn notice(&self) -> Option<NoticeHandle> {
        self.reporter.current()
    }

    pub fn status(&self) -> PreloadStatus {
        let Some(session) = self.loader.active_session() else {
            return PreloadStatus {
                is_loading: false,
                is_ready: false,
                is_complete: false,
                failed_count: 0,
                failed_resources: Vec::new(),
                load_time: None,
                stats: None,
            };
        };

        let failed_resources: Vec<FailedResource> = session
            .failures()
            .into_iter()
            .map(|o| FailedResource {
                id: o.resource_id,
                url: o.url,
                kind: o.kind,
                reason: o.reason.unwrap_or_default(),
            })
            .collect();

        PreloadStatus {
            is_loading: !session.is_complete(),
            is_ready: session.is_ready(),
            is_complete: session.is_complete(),
            failed_count: failed_resources.len(),
            failed_resources,
            load_time: session.load_time(),
            stats: Some(session.stats()),
        }
    }

    /// Cancel in-flight loads, drop the cache and remove the notice.
    pub fn destroy(&self) {
        if let Some(session) = self.loader.reset() {
            session.cache().clear();
        }
        self.reporter.clear();
        info!("preloader destroyed");
    }
}

// Per-resource deadline race: the fetch strategy for the resource kind against a fixed timer.

use std::sync::Arc;

use reqwest::Url;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::LoadError;
use super::fallback::FallbackApplier;
use super::outcome::{LoadOutcome, Payload};
use crate::catalog::{ResourceDescriptor, ResourceKind};
use crate::config::PreloadConfig;
use crate::host::traits::Host;

pub struct TimeoutRace {
    config: Arc<PreloadConfig>,
    host: Host,
    fallback: FallbackApplier,
}

impl TimeoutRace {
    pub fn new(config: Arc<PreloadConfig>, host: Host) -> Self {
        let fallback = FallbackApplier::new(host.image_refs.clone());
        Self {
            config,
            host,
            fallback,
        }
    }

    /// Load one resource against the deadline. Never fails: errors become the outcome.
    pub async fn load(&self, descriptor: &ResourceDescriptor) -> LoadOutcome {
        self.load_with_cancel(descriptor, &CancellationToken::new())
            .await
    }

    /// Like `load`, but also stops early once `cancel` fires.
    pub async fn load_with_cancel(
        &self,
        descriptor: &ResourceDescriptor,
        cancel: &CancellationToken,
    ) -> LoadOutcome {
        let started = self.host.clock.now();
        debug!(
            "loading {} kind={} url={}",
            descriptor.id, descriptor.kind, descriptor.url
        );

        // Cancelled whichever branch loses, so a late strategy can never settle twice.
        let controller = cancel.child_token();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LoadError::Cancelled),
            res = self.fetch(descriptor, &controller) => res,
            _ = self.host.clock.sleep(self.config.deadline()) => {
                warn!(
                    "{} exceeded the {}ms budget",
                    descriptor.id, self.config.deadline_ms
                );
                Err(LoadError::Timeout)
            }
        };
        controller.cancel();

        let elapsed = self.host.clock.now().duration_since(started);
        match result {
            Ok(payload) => {
                info!("{} loaded in {}ms", descriptor.id, elapsed.as_millis());
                LoadOutcome::success(descriptor, payload, elapsed)
            }
            Err(LoadError::Cancelled) => {
                debug!("{} cancelled after {}ms", descriptor.id, elapsed.as_millis());
                LoadOutcome::failure(descriptor, &LoadError::Cancelled, elapsed)
            }
            Err(e) => {
                warn!("{} failed: {}", descriptor.id, e);
                self.fallback.apply(descriptor);
                LoadOutcome::failure(descriptor, &e, elapsed)
            }
        }
    }

    async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        controller: &CancellationToken,
    ) -> Result<Payload, LoadError> {
        match descriptor.kind {
            ResourceKind::Image => self.fetch_image(descriptor).await,
            ResourceKind::Font => self.fetch_font(descriptor).await,
            ResourceKind::Generic => self.fetch_generic(descriptor, controller).await,
        }
    }

    async fn fetch_image(&self, descriptor: &ResourceDescriptor) -> Result<Payload, LoadError> {
        let cross_origin = self.is_cross_origin(&descriptor.url);
        self.host
            .images
            .load_image(&descriptor.url, cross_origin)
            .await
            .map(Payload::Handle)
    }

    /// Fonts never block: the hint resolves as success once the grace period runs out.
    async fn fetch_font(&self, descriptor: &ResourceDescriptor) -> Result<Payload, LoadError> {
        tokio::select! {
            biased;
            res = self.host.fonts.preload_font(&descriptor.url) => res.map(Payload::Handle),
            _ = self.host.clock.sleep(self.config.font_grace()) => {
                debug!("font {} still pending after grace period", descriptor.id);
                Ok(Payload::Empty)
            }
        }
    }

    /// The fetch aborts itself at the sub-deadline so the outer deadline rarely fires first.
    async fn fetch_generic(
        &self,
        descriptor: &ResourceDescriptor,
        controller: &CancellationToken,
    ) -> Result<Payload, LoadError> {
        let abort = controller.child_token();
        let fetch = self.host.fetcher.fetch(&descriptor.url, abort.clone());
        tokio::pin!(fetch);

        let early = tokio::select! {
            biased;
            res = &mut fetch => Some(res),
            _ = self.host.clock.sleep(self.config.fetch_deadline()) => None,
        };
        let aborted = early.is_none();
        let res = match early {
            Some(res) => res,
            None => {
                debug!("aborting fetch of {} at sub-deadline", descriptor.id);
                abort.cancel();
                fetch.await
            }
        };

        match res {
            Ok(body) => Ok(Payload::Body(body)),
            Err(LoadError::Cancelled) if aborted => Err(LoadError::RequestTimedOut),
            Err(e) => Err(e),
        }
    }

    fn is_cross_origin(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.config.cross_origin_hosts.iter().any(|pattern| {
            host == pattern || host.ends_with(&format!(".{}", pattern))
        })
    }
}

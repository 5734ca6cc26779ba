// Scripted host shared by the integration tests. Timing follows tokio's (paused) clock.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use smart_preload_engine::catalog::{Priority, ResourceDescriptor, ResourceKind};
use smart_preload_engine::engine::LoadError;
use smart_preload_engine::host::{
    Fetcher, FontLoader, Host, HostHandle, ImageLoader, MemoryDocument, TokioClock,
};

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed { after_ms: u64 },
    Fail { after_ms: u64, error: LoadError },
    /// Never settles, even when its cancellation token fires.
    Hang,
    /// Settles with `Cancelled` once its token fires.
    HangUntilCancelled,
    Panic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Started,
    Settled,
    /// The load future was dropped before it settled.
    Dropped,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub url: String,
    pub kind: EventKind,
    pub at: Instant,
}

type EventLog = Arc<Mutex<Vec<Event>>>;

struct SettleGuard {
    events: EventLog,
    url: String,
    settled: bool,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.events.lock().push(Event {
                url: self.url.clone(),
                kind: EventKind::Dropped,
                at: Instant::now(),
            });
        }
    }
}

#[derive(Default)]
pub struct ScriptedLoader {
    behaviors: Mutex<HashMap<String, Behavior>>,
    events: EventLog,
    tokens: Mutex<Vec<(String, CancellationToken)>>,
    next_handle: AtomicU64,
}

impl ScriptedLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, behavior: Behavior) {
        self.behaviors.lock().insert(url.to_string(), behavior);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, url: &str) -> Vec<EventKind> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.url == url)
            .map(|e| e.kind)
            .collect()
    }

    pub fn first(&self, url: &str, kind: EventKind) -> Option<Instant> {
        self.events
            .lock()
            .iter()
            .find(|e| e.url == url && e.kind == kind)
            .map(|e| e.at)
    }

    /// Cancellation token handed to the fetch of `url`.
    pub fn token_for(&self, url: &str) -> Option<CancellationToken> {
        self.tokens
            .lock()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, t)| t.clone())
    }

    fn push(&self, url: &str, kind: EventKind) {
        self.events.lock().push(Event {
            url: url.to_string(),
            kind,
            at: Instant::now(),
        });
    }

    async fn run(&self, url: &str, cancel: Option<CancellationToken>) -> Result<(), LoadError> {
        let behavior = self
            .behaviors
            .lock()
            .get(url)
            .cloned()
            .unwrap_or(Behavior::Succeed { after_ms: 0 });
        self.push(url, EventKind::Started);
        let mut guard = SettleGuard {
            events: self.events.clone(),
            url: url.to_string(),
            settled: false,
        };

        let result = match behavior {
            Behavior::Succeed { after_ms } => {
                tokio::time::sleep(Duration::from_millis(after_ms)).await;
                Ok(())
            }
            Behavior::Fail { after_ms, error } => {
                tokio::time::sleep(Duration::from_millis(after_ms)).await;
                Err(error)
            }
            Behavior::Hang => std::future::pending().await,
            Behavior::HangUntilCancelled => match cancel {
                Some(token) => {
                    token.cancelled().await;
                    Err(LoadError::Cancelled)
                }
                None => std::future::pending().await,
            },
            Behavior::Panic => panic!("scripted panic for {}", url),
        };

        guard.settled = true;
        self.push(url, EventKind::Settled);
        result
    }

    fn handle(&self) -> HostHandle {
        HostHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl Fetcher for ScriptedLoader {
    async fn fetch(&self, url: &str, cancel: CancellationToken) -> Result<Bytes, LoadError> {
        self.tokens.lock().push((url.to_string(), cancel.clone()));
        self.run(url, Some(cancel)).await?;
        Ok(Bytes::copy_from_slice(url.as_bytes()))
    }
}

#[async_trait]
impl ImageLoader for ScriptedLoader {
    async fn load_image(&self, url: &str, _cross_origin: bool) -> Result<HostHandle, LoadError> {
        self.run(url, None).await?;
        Ok(self.handle())
    }
}

#[async_trait]
impl FontLoader for ScriptedLoader {
    async fn preload_font(&self, url: &str) -> Result<HostHandle, LoadError> {
        self.run(url, None).await?;
        Ok(self.handle())
    }
}

pub fn scripted_host(loader: &Arc<ScriptedLoader>, doc: &Arc<MemoryDocument>) -> Host {
    Host {
        clock: Arc::new(TokioClock),
        fetcher: loader.clone(),
        images: loader.clone(),
        fonts: loader.clone(),
        image_refs: doc.clone(),
        notices: doc.clone(),
    }
}

pub fn resource(id: &str, kind: ResourceKind, priority: Priority) -> ResourceDescriptor {
    ResourceDescriptor::new(id, url(id), kind, priority)
}

pub fn url(id: &str) -> String {
    format!("https://assets.example.com/{}", id)
}

/// Let spawned tasks run without moving the paused clock past any pending timer.
pub async fn settle_tasks() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

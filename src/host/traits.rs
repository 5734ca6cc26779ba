use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::engine::error::LoadError;
use crate::report::notice::Notice;

/// Handle to an image or font object the host keeps alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostHandle(pub u64);

/// Identifies a document element (image reference, reveal target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
    fn now(&self) -> Instant;
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a body. Should return `LoadError::Cancelled` promptly once `cancel` fires.
    async fn fetch(&self, url: &str, cancel: CancellationToken) -> Result<Bytes, LoadError>;
}

#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Resolves on the image's load or error event.
    async fn load_image(&self, url: &str, cross_origin: bool) -> Result<HostHandle, LoadError>;
}

#[async_trait]
pub trait FontLoader: Send + Sync {
    /// Issue a preload hint and resolve on its load or error event.
    async fn preload_font(&self, url: &str) -> Result<HostHandle, LoadError>;
}

/// Image references in the document, for fallback substitution.
pub trait ImageRefs: Send + Sync {
    /// Images whose source equals or contains `url`.
    fn images_matching(&self, url: &str) -> Vec<ElementId>;
    fn set_image_source(&self, image: ElementId, src: &str);
    fn set_opacity(&self, image: ElementId, opacity: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    Shown,
    Hidden,
}

/// User input on a mounted notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAction {
    Close,
    /// Click anywhere on the notice. Only backdrop clicks dismiss.
    Click { on_backdrop: bool },
}

pub trait NoticeSurface: Send + Sync {
    fn is_mounted(&self, notice_id: &str) -> bool;
    /// Attach the notice. The host forwards user input through `actions`.
    fn mount(&self, notice: &Notice, actions: mpsc::UnboundedSender<NoticeAction>);
    fn set_phase(&self, notice_id: &str, phase: NoticePhase);
    fn remove(&self, notice_id: &str);
}

pub trait RevealSurface: Send + Sync {
    fn add_class(&self, element: ElementId, class: &str);
    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn set_style_property(&self, element: ElementId, name: &str, value: &str);
}

/// One visibility change reported by the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    pub element: ElementId,
    pub is_intersecting: bool,
    pub ratio: f64,
}

pub trait VisibilityObserver: Send + Sync {
    fn observe(&self, element: ElementId);
    fn unobserve(&self, element: ElementId);
    fn disconnect(&self);
}

/// Capabilities the preloader needs from its host.
#[derive(Clone)]
pub struct Host {
    pub clock: Arc<dyn Clock>,
    pub fetcher: Arc<dyn Fetcher>,
    pub images: Arc<dyn ImageLoader>,
    pub fonts: Arc<dyn FontLoader>,
    pub image_refs: Arc<dyn ImageRefs>,
    pub notices: Arc<dyn NoticeSurface>,
}

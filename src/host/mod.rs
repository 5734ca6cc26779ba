// Host capabilities: timers, network, DOM surfaces. Real hosts and the in-memory document live here.

pub mod clock;
pub mod http;
pub mod memory;
pub mod traits;

pub use clock::TokioClock;
pub use http::HttpLoader;
pub use memory::MemoryDocument;
pub use traits::{
    Clock, ElementId, Fetcher, FontLoader, Host, HostHandle, ImageLoader, ImageRefs, NoticeAction,
    NoticePhase, NoticeSurface, RevealSurface, VisibilityEntry, VisibilityObserver,
};

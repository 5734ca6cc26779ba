// In-memory document: image references, mounted notices, classes, styles and observation.
// Backs headless runs and tests; a browser host implements the same traits over the real DOM.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use super::traits::{
    ElementId, ImageRefs, NoticeAction, NoticePhase, NoticeSurface, RevealSurface,
    VisibilityObserver,
};
use crate::report::notice::Notice;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub src: String,
    pub opacity: f32,
}

struct MountedNotice {
    notice: Notice,
    phase: Option<NoticePhase>,
    actions: mpsc::UnboundedSender<NoticeAction>,
}

#[derive(Default)]
struct DocumentState {
    images: HashMap<ElementId, ImageRef>,
    notices: HashMap<String, MountedNotice>,
    classes: HashMap<ElementId, BTreeSet<String>>,
    styles: HashMap<ElementId, HashMap<String, String>>,
    observed: HashSet<ElementId>,
}

#[derive(Default)]
pub struct MemoryDocument {
    state: Mutex<DocumentState>,
    next_id: AtomicU64,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&self) -> ElementId {
        ElementId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a plain element (reveal target).
    pub fn add_element(&self) -> ElementId {
        let id = self.mint();
        self.state.lock().classes.insert(id, BTreeSet::new());
        id
    }

    pub fn add_image(&self, src: &str) -> ElementId {
        let id = self.mint();
        self.state.lock().images.insert(
            id,
            ImageRef {
                src: src.to_string(),
                opacity: 1.0,
            },
        );
        id
    }

    pub fn image(&self, id: ElementId) -> Option<ImageRef> {
        self.state.lock().images.get(&id).cloned()
    }

    pub fn notice(&self, notice_id: &str) -> Option<Notice> {
        self.state
            .lock()
            .notices
            .get(notice_id)
            .map(|m| m.notice.clone())
    }

    pub fn notice_phase(&self, notice_id: &str) -> Option<NoticePhase> {
        self.state
            .lock()
            .notices
            .get(notice_id)
            .and_then(|m| m.phase)
    }

    pub fn mounted_notice_count(&self) -> usize {
        self.state.lock().notices.len()
    }

    /// Deliver user input to a mounted notice. Returns false if it is not mounted.
    pub fn dispatch(&self, notice_id: &str, action: NoticeAction) -> bool {
        let state = self.state.lock();
        match state.notices.get(notice_id) {
            Some(m) => m.actions.send(action).is_ok(),
            None => false,
        }
    }

    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.state
            .lock()
            .classes
            .get(&element)
            .map(|c| c.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn style(&self, element: ElementId, name: &str) -> Option<String> {
        self.state
            .lock()
            .styles
            .get(&element)
            .and_then(|s| s.get(name).cloned())
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.state.lock().observed.contains(&element)
    }
}

impl ImageRefs for MemoryDocument {
    fn images_matching(&self, url: &str) -> Vec<ElementId> {
        let state = self.state.lock();
        let mut ids: Vec<ElementId> = state
            .images
            .iter()
            .filter(|(_, img)| img.src == url || img.src.contains(url))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn set_image_source(&self, image: ElementId, src: &str) {
        if let Some(img) = self.state.lock().images.get_mut(&image) {
            img.src = src.to_string();
        }
    }

    fn set_opacity(&self, image: ElementId, opacity: f32) {
        if let Some(img) = self.state.lock().images.get_mut(&image) {
            img.opacity = opacity;
        }
    }
}

impl NoticeSurface for MemoryDocument {
    fn is_mounted(&self, notice_id: &str) -> bool {
        self.state.lock().notices.contains_key(notice_id)
    }

    fn mount(&self, notice: &Notice, actions: mpsc::UnboundedSender<NoticeAction>) {
        debug!("mounting notice {}", notice.dom_id);
        self.state.lock().notices.insert(
            notice.dom_id.clone(),
            MountedNotice {
                notice: notice.clone(),
                phase: None,
                actions,
            },
        );
    }

    fn set_phase(&self, notice_id: &str, phase: NoticePhase) {
        if let Some(m) = self.state.lock().notices.get_mut(notice_id) {
            m.phase = Some(phase);
        }
    }

    fn remove(&self, notice_id: &str) {
        self.state.lock().notices.remove(notice_id);
    }
}

impl RevealSurface for MemoryDocument {
    fn add_class(&self, element: ElementId, class: &str) {
        self.state
            .lock()
            .classes
            .entry(element)
            .or_default()
            .insert(class.to_string());
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.state
            .lock()
            .classes
            .get(&element)
            .map(|c| c.contains(class))
            .unwrap_or(false)
    }

    fn set_style_property(&self, element: ElementId, name: &str, value: &str) {
        self.state
            .lock()
            .styles
            .entry(element)
            .or_default()
            .insert(name.to_string(), value.to_string());
    }
}

impl VisibilityObserver for MemoryDocument {
    fn observe(&self, element: ElementId) {
        self.state.lock().observed.insert(element);
    }

    fn unobserve(&self, element: ElementId) {
        self.state.lock().observed.remove(&element);
    }

    fn disconnect(&self) {
        self.state.lock().observed.clear();
    }
}

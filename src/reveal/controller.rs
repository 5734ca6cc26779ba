use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::animation::AnimationType;
use crate::config::RevealConfig;
use crate::host::traits::{Clock, ElementId, RevealSurface, VisibilityEntry, VisibilityObserver};

pub const SCROLL_ANIMATED_CLASS: &str = "scroll-animated";
pub const ANIMATED_CLASS: &str = "animated";
pub const DELAY_PROPERTY: &str = "--animation-delay";

#[derive(Debug, Clone, PartialEq)]
pub struct RevealStats {
    pub total_elements: u32,
    pub animated_elements: u32,
    pub runtime: Duration,
    /// Percentage of registered elements already revealed.
    pub animation_ratio: f64,
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    element: ElementId,
    animation: AnimationType,
    delay: Duration,
}

#[derive(Default)]
struct RevealState {
    initialized: bool,
    started_at: Option<Instant>,
    total: u32,
    animated: u32,
    registered: Vec<Registration>,
}

pub struct RevealController {
    config: RevealConfig,
    surface: Arc<dyn RevealSurface>,
    observer: Arc<dyn VisibilityObserver>,
    clock: Arc<dyn Clock>,
    state: Mutex<RevealState>,
}

impl RevealController {
    pub fn new(
        config: RevealConfig,
        surface: Arc<dyn RevealSurface>,
        observer: Arc<dyn VisibilityObserver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            surface,
            observer,
            clock,
            state: Mutex::new(RevealState::default()),
        }
    }

    /// Start observing. Elements registered earlier are observed now.
    pub fn init(&self) {
        let mut state = self.state.lock();
        if state.initialized {
            warn!("reveal controller already initialized");
            return;
        }
        state.initialized = true;
        state.started_at = Some(self.clock.now());
        for reg in &state.registered {
            self.observer.observe(reg.element);
        }
        info!(
            "reveal controller initialized with {} element(s)",
            state.registered.len()
        );
    }

    pub fn animate_element(&self, element: ElementId, animation: AnimationType, delay: Duration) {
        let mut state = self.state.lock();
        self.register(&mut state, element, animation, delay);
        state.registered.retain(|r| r.element != element);
        state.registered.push(Registration {
            element,
            animation,
            delay,
        });
    }

    /// Register a group of siblings, staggering their delays when `stagger` is set.
    pub fn animate_group(&self, elements: &[ElementId], animation: AnimationType, stagger: bool) {
        if elements.is_empty() {
            debug!("no elements to animate with {}", animation);
            return;
        }
        debug!("adding {} animation to {} element(s)", animation, elements.len());
        for (index, element) in elements.iter().enumerate() {
            let delay = if stagger {
                Duration::from_millis(index as u64 * self.config.delay_increment_ms)
            } else {
                Duration::ZERO
            };
            self.animate_element(*element, animation, delay);
        }
    }

    fn register(
        &self,
        state: &mut RevealState,
        element: ElementId,
        animation: AnimationType,
        delay: Duration,
    ) {
        self.surface.add_class(element, SCROLL_ANIMATED_CLASS);
        self.surface.add_class(element, &animation.class_name());
        if !delay.is_zero() {
            self.surface.set_style_property(
                element,
                DELAY_PROPERTY,
                &format!("{}ms", delay.as_millis()),
            );
        }
        if state.initialized {
            self.observer.observe(element);
        }
        state.total += 1;
    }

    /// Feed visibility changes from the observer. Needs a tokio runtime for the settle timer.
    pub fn on_visibility(&self, entries: &[VisibilityEntry]) {
        for entry in entries {
            if !entry.is_intersecting || entry.ratio < self.config.threshold {
                continue;
            }
            if !self.is_tracked(entry.element) {
                debug!("ignoring visibility of untracked element {:?}", entry.element);
                continue;
            }
            self.reveal(entry.element);
        }
    }

    /// Only registered elements of an initialized controller can be revealed.
    fn is_tracked(&self, element: ElementId) -> bool {
        let state = self.state.lock();
        state.initialized && state.registered.iter().any(|r| r.element == element)
    }

    fn reveal(&self, element: ElementId) {
        if self.surface.has_class(element, ANIMATED_CLASS) {
            if self.config.once {
                self.observer.unobserve(element);
            }
            return;
        }
        self.surface.add_class(element, ANIMATED_CLASS);

        let delay = {
            let mut state = self.state.lock();
            state.animated += 1;
            state
                .registered
                .iter()
                .find(|r| r.element == element)
                .map(|r| r.delay)
                .unwrap_or_default()
        };

        // Drop the will-change hint once the transition has run.
        let settle = Duration::from_millis(self.config.duration_ms) + delay;
        let surface = self.surface.clone();
        let clock = self.clock.clone();
        tokio::spawn(async move {
            clock.sleep(settle).await;
            surface.set_style_property(element, "will-change", "auto");
        });

        if self.config.once {
            self.observer.unobserve(element);
        }
        debug!("revealed element {:?}", element);
    }

    /// Re-register everything against a fresh observer, e.g. after a page switch.
    pub fn refresh(&self) {
        self.observer.disconnect();
        let mut state = self.state.lock();
        state.total = 0;
        state.animated = 0;
        let registered = state.registered.clone();
        for reg in registered {
            self.register(&mut state, reg.element, reg.animation, reg.delay);
        }
        info!("reveal controller refreshed, {} element(s)", state.total);
    }

    /// Stop observing and forget every registration. `init` may be called again afterwards.
    pub fn destroy(&self) {
        self.observer.disconnect();
        let mut state = self.state.lock();
        let forgotten = state.registered.len();
        *state = RevealState::default();
        info!("reveal controller destroyed, {} element(s) released", forgotten);
    }

    pub fn stats(&self) -> RevealStats {
        let state = self.state.lock();
        let runtime = state
            .started_at
            .map(|t| self.clock.now().duration_since(t))
            .unwrap_or_default();
        let animation_ratio = if state.total > 0 {
            state.animated as f64 / state.total as f64 * 100.0
        } else {
            0.0
        };
        RevealStats {
            total_elements: state.total,
            animated_elements: state.animated,
            runtime,
            animation_ratio,
        }
    }
}

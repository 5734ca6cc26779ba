use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Deadline every single-resource load races against (8 s).
pub const DEFAULT_DEADLINE_MS: u64 = 8_000;

/// How much earlier than the outer deadline a generic fetch cancels itself (1 s).
pub const FETCH_DEADLINE_SLACK_MS: u64 = 1_000;

/// Fonts are enhancements: a preload hint resolves as success after this long (3 s).
pub const FONT_GRACE_MS: u64 = 3_000;

/// The failure notice dismisses itself after this many seconds (5 min).
pub const NOTICE_AUTO_DISMISS_SECS: u64 = 5 * 60;

/// Delay between hiding the notice and detaching it from the document.
pub const NOTICE_REMOVE_DELAY_MS: u64 = 300;

/// Opacity applied to an image whose source was replaced by its fallback.
pub const FALLBACK_OPACITY: f32 = 0.9;

/// Hosts whose images are requested with the cross-origin attribute set.
pub const DEFAULT_CROSS_ORIGIN_HOSTS: &[&str] = &["raw.githubusercontent.com"];

/// Fraction of an element that must be visible before it is revealed.
pub const REVEAL_THRESHOLD: f64 = 0.1;

/// Stagger step between siblings of a revealed group.
pub const REVEAL_DELAY_INCREMENT_MS: u64 = 50;

/// Length of a reveal transition.
pub const REVEAL_DURATION_MS: u64 = 600;

/// Configuration for the preloader and its failure notice.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// Per-resource deadline in milliseconds.
    pub deadline_ms: u64,
    /// Subtracted from `deadline_ms` to get the generic fetch sub-deadline.
    pub fetch_slack_ms: u64,
    /// Forced success delay for font preload hints.
    pub font_grace_ms: u64,
    /// Auto dismissal of the failure notice, in seconds.
    pub notice_auto_dismiss_secs: u64,
    /// Grace delay between the hidden and removed notice phases.
    pub notice_remove_delay_ms: u64,
    /// Image hosts that need the cross-origin attribute.
    pub cross_origin_hosts: Vec<String>,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            deadline_ms: DEFAULT_DEADLINE_MS,
            fetch_slack_ms: FETCH_DEADLINE_SLACK_MS,
            font_grace_ms: FONT_GRACE_MS,
            notice_auto_dismiss_secs: NOTICE_AUTO_DISMISS_SECS,
            notice_remove_delay_ms: NOTICE_REMOVE_DELAY_MS,
            cross_origin_hosts: DEFAULT_CROSS_ORIGIN_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl PreloadConfig {
    /// Parse a config from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| anyhow!("invalid preload config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.deadline_ms == 0 {
            return Err(anyhow!("deadline_ms must be > 0"));
        }
        if self.fetch_slack_ms >= self.deadline_ms {
            return Err(anyhow!(
                "fetch_slack_ms {} must be smaller than deadline_ms {}",
                self.fetch_slack_ms,
                self.deadline_ms
            ));
        }
        Ok(())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Sub-deadline for generic fetches, so the outer deadline is not the first to fire.
    pub fn fetch_deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms.saturating_sub(self.fetch_slack_ms))
    }

    pub fn font_grace(&self) -> Duration {
        Duration::from_millis(self.font_grace_ms)
    }

    pub fn notice_auto_dismiss(&self) -> Duration {
        Duration::from_secs(self.notice_auto_dismiss_secs)
    }

    pub fn notice_remove_delay(&self) -> Duration {
        Duration::from_millis(self.notice_remove_delay_ms)
    }
}

/// Configuration for the scroll-reveal controller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub threshold: f64,
    /// Stop observing an element after its first reveal.
    pub once: bool,
    pub delay_increment_ms: u64,
    pub duration_ms: u64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: REVEAL_THRESHOLD,
            once: true,
            delay_increment_ms: REVEAL_DELAY_INCREMENT_MS,
            duration_ms: REVEAL_DURATION_MS,
        }
    }
}

use std::fmt;

use crate::catalog::ResourceKind;
use crate::engine::outcome::LoadOutcome;

pub const NOTICE_TITLE: &str = "Some resources failed to load";
pub const NOTICE_TIP: &str =
    "The site is still fully usable; some icons may be shown in a fallback style.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeEntry {
    pub resource_id: String,
    pub kind: ResourceKind,
    pub reason: String,
}

/// Content of the failure notice. Markup and styling are left to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub dom_id: String,
    pub title: String,
    pub entries: Vec<NoticeEntry>,
    pub tip: String,
}

impl Notice {
    pub fn new(dom_id: impl Into<String>, entries: Vec<NoticeEntry>) -> Self {
        Self {
            dom_id: dom_id.into(),
            title: NOTICE_TITLE.to_string(),
            entries,
            tip: NOTICE_TIP.to_string(),
        }
    }

    /// One entry per failed or timed-out outcome; successes are skipped.
    pub fn from_outcomes(dom_id: impl Into<String>, outcomes: &[LoadOutcome]) -> Self {
        let entries = outcomes
            .iter()
            .filter(|o| o.is_failure())
            .map(|o| NoticeEntry {
                resource_id: o.resource_id.clone(),
                kind: o.kind,
                reason: o
                    .reason
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
            .collect();
        Self::new(dom_id, entries)
    }

    pub fn lists(&self, resource_id: &str) -> bool {
        self.entries.iter().any(|e| e.resource_id == resource_id)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for entry in &self.entries {
            writeln!(
                f,
                "  {} {} ({}: {})",
                entry.kind.icon(),
                entry.resource_id,
                entry.kind,
                entry.reason
            )?;
        }
        write!(f, "{}", self.tip)
    }
}

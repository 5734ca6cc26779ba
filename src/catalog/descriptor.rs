use std::fmt;

use serde::Deserialize;

/// Fetch strategy selector for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Font,
    Generic,
}

impl ResourceKind {
    /// Short glyph shown next to a failed resource in the notice.
    pub fn icon(&self) -> &'static str {
        match self {
            ResourceKind::Image => "🖼️",
            ResourceKind::Font => "🔤",
            ResourceKind::Generic => "📄",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Image => write!(f, "image"),
            ResourceKind::Font => write!(f, "font"),
            ResourceKind::Generic => write!(f, "generic"),
        }
    }
}

/// Priority tier. Declaration order is load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Background tiers are launched without blocking session readiness.
    pub fn is_background(&self) -> bool {
        matches!(self, Priority::Medium | Priority::Low)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// One fetchable asset. Immutable once defined.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceDescriptor {
    pub id: String,
    pub url: String,
    pub kind: ResourceKind,
    pub priority: Priority,
    /// Inline replacement (usually a `data:` URI) used when the load fails.
    #[serde(default)]
    pub fallback: Option<String>,
}

impl ResourceDescriptor {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        kind: ResourceKind,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            kind,
            priority,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// True when the fallback can be substituted into image references.
    pub fn has_inline_fallback(&self) -> bool {
        self.fallback
            .as_deref()
            .map(|f| f.starts_with("data:"))
            .unwrap_or(false)
    }
}

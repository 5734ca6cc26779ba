// Fallback substitution: rewrite image references of a failed resource to its inline payload.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{ResourceDescriptor, ResourceKind};
use crate::config::FALLBACK_OPACITY;
use crate::host::traits::ImageRefs;

pub struct FallbackApplier {
    refs: Arc<dyn ImageRefs>,
}

impl FallbackApplier {
    pub fn new(refs: Arc<dyn ImageRefs>) -> Self {
        Self { refs }
    }

    /// Substitute the descriptor's fallback into matching images. Returns how many were rewritten.
    ///
    /// Idempotent: once rewritten, references no longer match the original url.
    pub fn apply(&self, descriptor: &ResourceDescriptor) -> usize {
        let Some(fallback) = descriptor.fallback.as_deref() else {
            return 0;
        };
        if descriptor.kind != ResourceKind::Image || !descriptor.has_inline_fallback() {
            debug!(
                "fallback for {} skipped: only inline image fallbacks are substituted",
                descriptor.id
            );
            return 0;
        }

        let targets = self.refs.images_matching(&descriptor.url);
        for image in &targets {
            self.refs.set_image_source(*image, fallback);
            self.refs.set_opacity(*image, FALLBACK_OPACITY);
        }
        info!(
            "applied fallback for {} to {} image reference(s)",
            descriptor.id,
            targets.len()
        );
        targets.len()
    }
}

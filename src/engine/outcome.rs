use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use super::error::LoadError;
use crate::catalog::{ResourceDescriptor, ResourceKind};
use crate::host::traits::HostHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Success,
    Failed,
    TimedOut,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Success => write!(f, "success"),
            LoadStatus::Failed => write!(f, "failed"),
            LoadStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Opaque result of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Response body of a generic fetch.
    Body(Bytes),
    /// Image or font object owned by the host.
    Handle(HostHandle),
    /// A font that was still pending when its grace period ran out.
    Empty,
}

impl Payload {
    pub fn byte_len(&self) -> u64 {
        match self {
            Payload::Body(b) => b.len() as u64,
            _ => 0,
        }
    }
}

/// Result of one resource in one session. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub resource_id: String,
    pub url: String,
    pub kind: ResourceKind,
    pub status: LoadStatus,
    pub reason: Option<String>,
    pub payload: Option<Payload>,
    pub elapsed: Duration,
}

impl LoadOutcome {
    pub fn success(descriptor: &ResourceDescriptor, payload: Payload, elapsed: Duration) -> Self {
        Self {
            resource_id: descriptor.id.clone(),
            url: descriptor.url.clone(),
            kind: descriptor.kind,
            status: LoadStatus::Success,
            reason: None,
            payload: Some(payload),
            elapsed,
        }
    }

    pub fn failure(descriptor: &ResourceDescriptor, error: &LoadError, elapsed: Duration) -> Self {
        let status = if error.is_timeout() {
            LoadStatus::TimedOut
        } else {
            LoadStatus::Failed
        };
        Self {
            resource_id: descriptor.id.clone(),
            url: descriptor.url.clone(),
            kind: descriptor.kind,
            status,
            reason: Some(error.to_string()),
            payload: None,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == LoadStatus::Success
    }

    /// Failed or timed out.
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

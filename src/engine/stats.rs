// Session statistics: outcome counts, in-flight loads, downloaded bytes.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::outcome::{LoadOutcome, LoadStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub succeeded: u32,
    pub failed: u32,
    pub timed_out: u32,
    pub in_flight: u32,
    pub downloaded_bytes: u64,
    pub failure_rate: f64,
}

pub struct StatsCollector {
    succeeded: AtomicU32,
    failed: AtomicU32,
    timed_out: AtomicU32,
    in_flight: AtomicU32,
    downloaded_bytes: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            succeeded: AtomicU32::new(0),
            failed: AtomicU32::new(0),
            timed_out: AtomicU32::new(0),
            in_flight: AtomicU32::new(0),
            downloaded_bytes: AtomicU64::new(0),
        }
    }

    pub fn record_outcome(&self, outcome: &LoadOutcome) {
        let counter = match outcome.status {
            LoadStatus::Success => &self.succeeded,
            LoadStatus::Failed => &self.failed,
            LoadStatus::TimedOut => &self.timed_out,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if let Some(payload) = &outcome.payload {
            self.downloaded_bytes
                .fetch_add(payload.byte_len(), Ordering::Relaxed);
        }
    }

    pub fn increment_in_flight(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_in_flight(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let timed_out = self.timed_out.load(Ordering::Relaxed);
        let settled = succeeded + failed + timed_out;
        let failure_rate = if settled > 0 {
            (failed + timed_out) as f64 / settled as f64
        } else {
            0.0
        };

        StatsSnapshot {
            succeeded,
            failed,
            timed_out,
            in_flight: self.in_flight.load(Ordering::Relaxed),
            downloaded_bytes: self.downloaded_bytes.load(Ordering::Relaxed),
            failure_rate,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

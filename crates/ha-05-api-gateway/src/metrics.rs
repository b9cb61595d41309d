//! Request counters per route.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct GatewayMetrics {
    pub filter_requests: AtomicU64,
    pub not_modified: AtomicU64,
    pub report_requests: AtomicU64,
    pub reports_accepted: AtomicU64,
    pub reports_rejected: AtomicU64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GatewayMetricsSnapshot {
    pub filter_requests: u64,
    pub not_modified: u64,
    pub report_requests: u64,
    pub reports_accepted: u64,
    pub reports_rejected: u64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_filter_request(&self, not_modified: bool) {
        self.filter_requests.fetch_add(1, Ordering::Relaxed);
        if not_modified {
            self.not_modified.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_report(&self, accepted: bool) {
        self.report_requests.fetch_add(1, Ordering::Relaxed);
        if accepted {
            self.reports_accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.reports_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> GatewayMetricsSnapshot {
        GatewayMetricsSnapshot {
            filter_requests: self.filter_requests.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
            report_requests: self.report_requests.load(Ordering::Relaxed),
            reports_accepted: self.reports_accepted.load(Ordering::Relaxed),
            reports_rejected: self.reports_rejected.load(Ordering::Relaxed),
        }
    }
}

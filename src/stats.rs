//! Request outcome counters
//!
//! Every request served from the file listener is classified exactly once into
//! one of four buckets (OK, not modified, not found, other). OK responses also
//! add their `Content-Length` to the served byte total.

use hyper::StatusCode;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-wide counters, shared by `Arc` between all connections
#[derive(Debug, Default)]
pub struct FsCounters {
    calls: AtomicU64,
    ok: AtomicU64,
    not_modified: AtomicU64,
    not_found: AtomicU64,
    other: AtomicU64,
    ok_body_bytes: AtomicU64,
}

/// Point-in-time copy of the counters, serialized for the stats endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    #[serde(rename = "fsCalls")]
    pub calls: u64,
    #[serde(rename = "fsOKResponses")]
    pub ok: u64,
    #[serde(rename = "fsNotModifiedResponses")]
    pub not_modified: u64,
    #[serde(rename = "fsNotFoundResponses")]
    pub not_found: u64,
    #[serde(rename = "fsOtherResponses")]
    pub other: u64,
    #[serde(rename = "fsResponseBodyBytes")]
    pub ok_body_bytes: u64,
}

impl FsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a completed response by status code
    pub fn record(&self, status: StatusCode, content_length: u64) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match status {
            StatusCode::OK => {
                self.ok.fetch_add(1, Ordering::Relaxed);
                self.ok_body_bytes
                    .fetch_add(content_length, Ordering::Relaxed);
            }
            StatusCode::NOT_MODIFIED => {
                self.not_modified.fetch_add(1, Ordering::Relaxed);
            }
            StatusCode::NOT_FOUND => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.other.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a request that never produced a response
    fn record_aborted(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.other.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            ok: self.ok.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
            ok_body_bytes: self.ok_body_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Guarantees a request is counted exactly once.
///
/// Call [`OutcomeGuard::finish`] with the final status. If the guard is
/// dropped first (the client went away and hyper dropped the handler future),
/// the request is counted under "other".
#[must_use = "dropping the guard counts the request as aborted"]
pub struct OutcomeGuard {
    counters: Option<Arc<FsCounters>>,
}

impl OutcomeGuard {
    pub const fn new(counters: Arc<FsCounters>) -> Self {
        Self {
            counters: Some(counters),
        }
    }

    pub fn finish(mut self, status: StatusCode, content_length: u64) {
        if let Some(counters) = self.counters.take() {
            counters.record(status, content_length);
        }
    }
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if let Some(counters) = self.counters.take() {
            counters.record_aborted();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_buckets() {
        let counters = FsCounters::new();
        counters.record(StatusCode::OK, 100);
        counters.record(StatusCode::OK, 23);
        counters.record(StatusCode::NOT_MODIFIED, 0);
        counters.record(StatusCode::NOT_FOUND, 13);
        counters.record(StatusCode::PARTIAL_CONTENT, 10);
        counters.record(StatusCode::RANGE_NOT_SATISFIABLE, 0);

        let snap = counters.snapshot();
        assert_eq!(snap.calls, 6);
        assert_eq!(snap.ok, 2);
        assert_eq!(snap.not_modified, 1);
        assert_eq!(snap.not_found, 1);
        assert_eq!(snap.other, 2);
        assert_eq!(snap.ok_body_bytes, 123);
        assert_eq!(
            snap.calls,
            snap.ok + snap.not_modified + snap.not_found + snap.other
        );
    }

    #[test]
    fn test_guard_finish_counts_once() {
        let counters = Arc::new(FsCounters::new());
        let guard = OutcomeGuard::new(Arc::clone(&counters));
        guard.finish(StatusCode::OK, 42);

        let snap = counters.snapshot();
        assert_eq!(snap.calls, 1);
        assert_eq!(snap.ok, 1);
        assert_eq!(snap.other, 0);
        assert_eq!(snap.ok_body_bytes, 42);
    }

    #[test]
    fn test_guard_drop_counts_as_other() {
        let counters = Arc::new(FsCounters::new());
        {
            let _guard = OutcomeGuard::new(Arc::clone(&counters));
        }

        let snap = counters.snapshot();
        assert_eq!(snap.calls, 1);
        assert_eq!(snap.other, 1);
        assert_eq!(snap.ok_body_bytes, 0);
    }

    #[test]
    fn test_snapshot_json_names() {
        let counters = FsCounters::new();
        counters.record(StatusCode::OK, 5);
        let json = serde_json::to_string(&counters.snapshot()).unwrap();
        assert!(json.contains(r#""fsCalls":1"#));
        assert!(json.contains(r#""fsOKResponses":1"#));
        assert!(json.contains(r#""fsNotModifiedResponses":0"#));
        assert!(json.contains(r#""fsNotFoundResponses":0"#));
        assert!(json.contains(r#""fsOtherResponses":0"#));
        assert!(json.contains(r#""fsResponseBodyBytes":5"#));
    }

    #[test]
    fn test_concurrent_increments() {
        let counters = Arc::new(FsCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.record(StatusCode::OK, 2);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = counters.snapshot();
        assert_eq!(snap.calls, 8000);
        assert_eq!(snap.ok_body_bytes, 16000);
    }
}

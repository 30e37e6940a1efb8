use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

pub const DEFAULT_MAX_ERRORS_PER_PATH: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Timeout,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Timeout => "timeout",
        }
    }
}

// why a single request failed, with the url it was sent to
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    pub kind: FailureKind,
    pub cause: String,
    pub url: String,
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (URL: {})", self.cause, self.url)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Status(u16),
    Failed(ErrorDescriptor),
}

/// The terminal result of one request attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestOutcome {
    pub path: String,
    pub latency_ms: Option<f64>,
    pub outcome: Outcome,
}

impl RequestOutcome {
    pub fn success(path: impl Into<String>, latency_ms: f64, status: u16) -> Self {
        Self {
            path: path.into(),
            latency_ms: Some(latency_ms.max(0.0)),
            outcome: Outcome::Status(status),
        }
    }

    pub fn failure(path: impl Into<String>, error: ErrorDescriptor) -> Self {
        Self {
            path: path.into(),
            latency_ms: None,
            outcome: Outcome::Failed(error),
        }
    }
}

/// Everything recorded for one path during a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PathRecord {
    pub latencies: Vec<f64>,
    pub status_counts: BTreeMap<u16, u64>,
    /// Exact number of failed attempts, including ones whose descriptor was
    /// not retained.
    pub error_count: u64,
    pub errors: Vec<ErrorDescriptor>,
}

impl PathRecord {
    pub fn success_count(&self) -> u64 {
        self.latencies.len() as u64
    }

    pub fn total(&self) -> u64 {
        self.success_count() + self.error_count
    }
}

/// Shared accumulator written by every in-flight request.
#[derive(Clone, Debug)]
pub struct ResultStore {
    records: Arc<Mutex<HashMap<String, PathRecord>>>,
    max_errors_per_path: usize,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ERRORS_PER_PATH)
    }
}

impl ResultStore {
    pub fn new(max_errors_per_path: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            max_errors_per_path,
        }
    }

    pub async fn record(&self, outcome: RequestOutcome) {
        let RequestOutcome {
            path,
            latency_ms,
            outcome,
        } = outcome;
        let mut records = self.records.lock().await;
        let entry = records.entry(path).or_default();
        match outcome {
            Outcome::Status(status) => {
                entry.latencies.push(latency_ms.unwrap_or(0.0));
                *entry.status_counts.entry(status).or_insert(0) += 1;
            }
            Outcome::Failed(error) => {
                entry.error_count += 1;
                if entry.errors.len() < self.max_errors_per_path {
                    entry.errors.push(error);
                }
            }
        }
    }

    /// Copy of the record for `path`; empty when nothing was recorded.
    pub async fn snapshot(&self, path: &str) -> PathRecord {
        self.records
            .lock()
            .await
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn snapshot_all(&self) -> HashMap<String, PathRecord> {
        self.records.lock().await.clone()
    }

    pub async fn total_outcomes(&self) -> u64 {
        self.records.lock().await.values().map(|r| r.total()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout_error(url: &str) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: FailureKind::Timeout,
            cause: "request timed out".to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn concurrent_writers_lose_nothing() {
        let store = ResultStore::default();
        let mut handles = Vec::new();
        for worker in 0..32u16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50u16 {
                    let path = if i % 2 == 0 { "a" } else { "b" };
                    if (worker + i) % 5 == 0 {
                        store
                            .record(RequestOutcome::failure(path, timeout_error(path)))
                            .await;
                    } else {
                        store
                            .record(RequestOutcome::success(path, f64::from(i), 200 + (i % 3)))
                            .await;
                    }
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.total_outcomes().await, 32 * 50);
        for path in ["a", "b"] {
            let rec = store.snapshot(path).await;
            assert_eq!(rec.total(), 32 * 25);
            let histogram_total: u64 = rec.status_counts.values().sum();
            assert_eq!(histogram_total, rec.success_count());
        }
    }

    #[tokio::test]
    async fn error_cap_keeps_exact_count() {
        let store = ResultStore::new(3);
        for _ in 0..10 {
            store
                .record(RequestOutcome::failure("x", timeout_error("http://h/x")))
                .await;
        }
        let rec = store.snapshot("x").await;
        assert_eq!(rec.error_count, 10);
        assert_eq!(rec.errors.len(), 3);
        assert!(rec.latencies.is_empty());
    }

    #[tokio::test]
    async fn unknown_path_snapshot_is_empty() {
        let store = ResultStore::default();
        assert_eq!(store.snapshot("missing").await, PathRecord::default());
    }

    #[test]
    fn error_descriptor_mentions_url() {
        let e = timeout_error("http://localhost:8270/index.html");
        assert_eq!(
            e.to_string(),
            "request timed out (URL: http://localhost:8270/index.html)"
        );
    }
}

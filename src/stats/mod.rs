use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::PathGroup;
use crate::store::{ErrorDescriptor, PathRecord};

pub const P95_MIN_SAMPLES: usize = 20;
pub const P99_MIN_SAMPLES: usize = 100;

/// Latency summary over a set of successful requests. All values are in
/// milliseconds except `throughput`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupStats {
    pub count: usize,
    pub avg: f64,
    pub median: f64,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// `count / (max / 1000)`: samples divided by the slowest single request
    /// in seconds. This is not wall-clock requests per second; it is kept
    /// for parity with existing reports. `None` when `max` is zero.
    pub throughput: Option<f64>,
}

pub fn compute_stats(latencies: &[f64]) -> Option<GroupStats> {
    if latencies.is_empty() {
        return None;
    }
    let mut sorted = latencies.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let min = sorted[0];
    let max = sorted[count - 1];

    let p95 = if count >= P95_MIN_SAMPLES {
        quantiles(&sorted, 20).get(18).copied()
    } else {
        None
    };
    let p99 = if count >= P99_MIN_SAMPLES {
        quantiles(&sorted, 100).get(98).copied()
    } else {
        None
    };
    let throughput = if max > 0.0 {
        Some(count as f64 / (max / 1000.0))
    } else {
        None
    };

    Some(GroupStats {
        count,
        avg: sum / count as f64,
        median: median(&sorted),
        p95,
        p99,
        min,
        max,
        throughput,
    })
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Cut points dividing `sorted` into `n` intervals of equal probability,
/// using the exclusive method (`m = len + 1`, linear interpolation).
/// Returns `n - 1` values, or nothing when fewer than two samples exist.
pub fn quantiles(sorted: &[f64], n: usize) -> Vec<f64> {
    let len = sorted.len();
    if n < 2 || len < 2 {
        return Vec::new();
    }
    let m = len + 1;
    (1..n)
        .map(|i| {
            let j = (i * m / n).clamp(1, len - 1);
            let delta = (i * m) as f64 - (j * n) as f64;
            (sorted[j - 1] * (n as f64 - delta) + sorted[j] * delta) / n as f64
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GroupSummary {
    Stats {
        stats: GroupStats,
        status_counts: BTreeMap<u16, u64>,
        error_count: u64,
    },
    /// Nothing succeeded for any path in the group.
    NoRequests { error_count: u64 },
}

impl GroupSummary {
    pub fn stats(&self) -> Option<&GroupStats> {
        match self {
            GroupSummary::Stats { stats, .. } => Some(stats),
            GroupSummary::NoRequests { .. } => None,
        }
    }

    pub fn error_count(&self) -> u64 {
        match self {
            GroupSummary::Stats { error_count, .. } | GroupSummary::NoRequests { error_count } => {
                *error_count
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub path_count: usize,
    pub summary: GroupSummary,
}

/// Stats over the union of every distinct path in `group`.
pub fn compute_group_stats(
    records: &HashMap<String, PathRecord>,
    group: &PathGroup,
) -> GroupReport {
    let paths = group.distinct_paths();
    let mut latencies: Vec<f64> = Vec::new();
    let mut status_counts: BTreeMap<u16, u64> = BTreeMap::new();
    let mut error_count = 0u64;

    for rec in paths.iter().filter_map(|p| records.get(*p)) {
        latencies.extend_from_slice(&rec.latencies);
        for (status, n) in rec.status_counts.iter() {
            *status_counts.entry(*status).or_insert(0) += n;
        }
        error_count += rec.error_count;
    }

    let summary = match compute_stats(&latencies) {
        Some(stats) => GroupSummary::Stats {
            stats,
            status_counts,
            error_count,
        },
        None => GroupSummary::NoRequests { error_count },
    };

    GroupReport {
        name: group.name.clone(),
        path_count: paths.len(),
        summary,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathReport {
    pub path: String,
    pub stats: Option<GroupStats>,
    pub status_counts: BTreeMap<u16, u64>,
    pub error_count: u64,
    pub errors: Vec<ErrorDescriptor>,
}

pub fn compute_path_stats(path: &str, record: Option<&PathRecord>) -> PathReport {
    match record {
        Some(rec) => PathReport {
            path: path.to_string(),
            stats: compute_stats(&rec.latencies),
            status_counts: rec.status_counts.clone(),
            error_count: rec.error_count,
            errors: rec.errors.clone(),
        },
        None => PathReport {
            path: path.to_string(),
            stats: None,
            status_counts: BTreeMap::new(),
            error_count: 0,
            errors: Vec::new(),
        },
    }
}

/// One attack category in the security summary.
///
/// 5xx responses count toward `total` but are neither blocked nor allowed,
/// so `blocked + allowed + errors` can fall short of `total`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecurityRow {
    pub category: String,
    pub total: u64,
    pub blocked: u64,
    pub allowed: u64,
    pub errors: u64,
}

pub fn compute_security_row(
    records: &HashMap<String, PathRecord>,
    group: &PathGroup,
) -> SecurityRow {
    let mut row = SecurityRow {
        category: group.name.clone(),
        total: 0,
        blocked: 0,
        allowed: 0,
        errors: 0,
    };
    for rec in group
        .distinct_paths()
        .iter()
        .filter_map(|p| records.get(*p))
    {
        row.total += rec.total();
        row.errors += rec.error_count;
        for (status, n) in rec.status_counts.iter() {
            if (400..500).contains(status) {
                row.blocked += n;
            } else if *status < 400 {
                row.allowed += n;
            }
        }
    }
    row
}

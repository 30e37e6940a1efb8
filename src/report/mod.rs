use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::catalog::PathCatalog;
use crate::dispatcher::DispatchStrategy;
use crate::stats::{self, GroupReport, PathReport, SecurityRow};
use crate::store::PathRecord;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunInfo {
    pub target: String,
    pub requests: usize,
    pub concurrency: usize,
    pub security: bool,
    pub strategy: DispatchStrategy,
    pub elapsed_ms: f64,
    pub completed: u64,
    pub failed: u64,
    /// Completed attempts divided by wall-clock run time.
    pub wall_clock_rps: Option<f64>,
}

impl RunInfo {
    pub fn new(
        target: &str,
        requests: usize,
        concurrency: usize,
        security: bool,
        strategy: DispatchStrategy,
        elapsed: Duration,
        records: &HashMap<String, PathRecord>,
    ) -> Self {
        let completed: u64 = records.values().map(|r| r.total()).sum();
        let failed: u64 = records.values().map(|r| r.error_count).sum();
        let secs = elapsed.as_secs_f64();
        Self {
            target: target.to_string(),
            requests,
            concurrency,
            security,
            strategy,
            elapsed_ms: secs * 1000.0,
            completed,
            failed,
            wall_clock_rps: if secs > 0.0 {
                Some(completed as f64 / secs)
            } else {
                None
            },
        }
    }
}

/// Finished result of a run, ready for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportModel {
    pub run: RunInfo,
    pub groups: Vec<GroupReport>,
    pub paths: Vec<PathReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRow>>,
}

impl ReportModel {
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn path(&self, path: &str) -> Option<&PathReport> {
        self.paths.iter().find(|p| p.path == path)
    }
}

pub fn build_report(
    catalog: &PathCatalog,
    records: &HashMap<String, PathRecord>,
    run: RunInfo,
) -> ReportModel {
    let active = catalog.active_groups(run.security);

    let groups = active
        .iter()
        .map(|g| stats::compute_group_stats(records, g))
        .collect();

    let mut paths: Vec<PathReport> = Vec::new();
    for g in active.iter() {
        for p in g.distinct_paths() {
            if paths.iter().any(|existing| existing.path == p) {
                continue;
            }
            paths.push(stats::compute_path_stats(p, records.get(p)));
        }
    }

    let security = if run.security {
        Some(
            active
                .iter()
                .filter(|g| g.is_security_group())
                .map(|g| stats::compute_security_row(records, g))
                .collect(),
        )
    } else {
        None
    };

    ReportModel {
        run,
        groups,
        paths,
        security,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{payloads, RANDOM_PATHS_GROUP, VALID_PAGES_GROUP};
    use crate::stats::GroupSummary;

    fn record(latencies: &[f64], statuses: &[(u16, u64)]) -> PathRecord {
        PathRecord {
            latencies: latencies.to_vec(),
            status_counts: statuses.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn run_info(security: bool, records: &HashMap<String, PathRecord>) -> RunInfo {
        RunInfo::new(
            "http://localhost:8270",
            10,
            2,
            security,
            DispatchStrategy::WorkerPool,
            Duration::from_millis(500),
            records,
        )
    }

    #[test]
    fn plain_report_has_only_valid_pages() {
        let catalog = PathCatalog::new(payloads::VALID_PAGES, 5);
        let mut records = HashMap::new();
        records.insert("index.html".to_string(), record(&[10.0, 20.0], &[(200, 2)]));

        let report = build_report(&catalog, &records, run_info(false, &records));

        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].name, VALID_PAGES_GROUP);
        assert!(report.security.is_none());
        assert_eq!(report.paths.len(), 4);
        assert!(report.path("nope.html").unwrap().stats.is_none());
        assert_eq!(report.run.completed, 2);
        assert_eq!(report.run.wall_clock_rps, Some(4.0));
    }

    #[test]
    fn security_report_lists_three_attack_rows_without_random_paths() {
        let catalog = PathCatalog::new(payloads::VALID_PAGES, 2);
        let random = catalog.group(RANDOM_PATHS_GROUP).unwrap().paths[0].clone();
        let mut records = HashMap::new();
        records.insert("/.env".to_string(), record(&[1.0], &[(403, 1)]));
        records.insert(random, record(&[1.0], &[(404, 1)]));

        let report = build_report(&catalog, &records, run_info(true, &records));

        let rows = report.security.as_ref().unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(
            names,
            vec!["Path Traversal", "Malicious Paths", "Special Characters"]
        );
        assert_eq!(rows[1].blocked, 1);
        assert_eq!(rows[0].total, 0);
        assert_eq!(report.groups.len(), 5);
        assert!(matches!(
            report.group("Path Traversal").unwrap().summary,
            GroupSummary::NoRequests { error_count: 0 }
        ));
    }
}

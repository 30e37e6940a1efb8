mod mock_server;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::ProgressBar;

use crate::catalog::{self, PathCatalog};
use crate::dispatcher::{DispatchStrategy, RequestError, Transport};
use crate::runner::{Options, Runner};
use crate::stats::GroupSummary;
use crate::store::FailureKind;

use mock_server::MockServer;

fn valid_pages_route() -> mock_server::Route {
    Arc::new(|path: &str| match path {
        "/" | "/index.html" => 200,
        "/404.html" | "/nope.html" => 404,
        _ => 403,
    })
}

fn options_for(url: &str, requests: usize, concurrency: usize) -> Options {
    Options {
        url: url.to_string(),
        requests,
        concurrency,
        ..Options::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn plain_run_against_slow_server() {
    let server = MockServer::start(valid_pages_route(), Duration::from_millis(50)).await;
    let runner = Runner::new(options_for(&server.base_url, 100, 10)).unwrap();

    let result = runner.run().await.unwrap();
    let report = &result.report;

    assert_eq!(report.run.completed, 100);
    assert_eq!(report.run.failed, 0);
    assert_eq!(server.hits(), 100);
    assert!(report.security.is_none());
    assert_eq!(report.groups.len(), 1);

    let group = &report.groups[0];
    assert_eq!(group.name, catalog::VALID_PAGES_GROUP);
    let stats = group.summary.stats().unwrap();
    assert_eq!(stats.count, 100);
    assert!(stats.p95.is_some());
    assert!(stats.p99.is_some());
    assert!(stats.avg >= 45.0, "avg {} below server delay", stats.avg);
    assert!(stats.avg < 250.0, "avg {} unreasonably high", stats.avg);

    match &group.summary {
        GroupSummary::Stats { status_counts, .. } => {
            assert!(status_counts.keys().all(|s| *s == 200 || *s == 404));
            assert_eq!(status_counts.values().sum::<u64>(), 100);
        }
        other => panic!("unexpected summary {other:?}"),
    }

    let per_path: u64 = report
        .paths
        .iter()
        .map(|p| p.status_counts.values().sum::<u64>())
        .sum();
    assert_eq!(per_path, 100);
    if let Some(root) = report.path("").and_then(|p| p.stats.as_ref()) {
        assert!(root.min >= 45.0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn security_run_reports_everything_blocked() {
    let server = MockServer::start(valid_pages_route(), Duration::ZERO).await;
    let runner = Runner::new(Options {
        include_security: true,
        ..options_for(&server.base_url, 600, 20)
    })
    .unwrap();

    let result = runner.run().await.unwrap();
    let report = &result.report;

    assert_eq!(report.run.completed, 600);
    assert_eq!(report.run.failed, 0);
    assert_eq!(report.groups.len(), 5);

    let rows = report.security.as_ref().unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows.iter() {
        assert!(row.total > 0, "{} was never drawn", row.category);
        assert_eq!(row.blocked, row.total, "{}", row.category);
        assert_eq!(row.allowed, 0, "{}", row.category);
        assert_eq!(row.errors, 0, "{}", row.category);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn waves_strategy_dispatches_every_request() {
    let server = MockServer::start(valid_pages_route(), Duration::from_millis(5)).await;
    let runner = Runner::new(Options {
        strategy: DispatchStrategy::Waves,
        ..options_for(&server.base_url, 45, 4)
    })
    .unwrap();

    let result = runner.run().await.unwrap();

    assert_eq!(result.report.run.completed, 45);
    assert_eq!(result.report.run.strategy, DispatchStrategy::Waves);
    assert_eq!(server.hits(), 45);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_server_times_out_every_request() {
    let server = MockServer::start(valid_pages_route(), Duration::from_secs(5)).await;
    let runner = Runner::new(Options {
        timeout_seconds: 1,
        pages: vec!["index.html".to_string()],
        ..options_for(&server.base_url, 4, 4)
    })
    .unwrap();

    let result = runner.run().await.unwrap();
    let report = &result.report;

    assert_eq!(report.run.completed, 4);
    assert_eq!(report.run.failed, 4);
    assert!(matches!(
        report.groups[0].summary,
        GroupSummary::NoRequests { error_count: 4 }
    ));
    let path = report.path("index.html").unwrap();
    assert!(path.stats.is_none());
    assert!(path.errors.iter().all(|e| e.kind == FailureKind::Timeout));
}

#[tokio::test]
async fn refused_connections_are_recorded_not_fatal() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = format!("http://{addr}");
    let runner = Runner::new(options_for(&base, 20, 5)).unwrap();
    let result = runner.run().await.unwrap();
    let report = &result.report;

    assert_eq!(report.run.completed, 20);
    assert_eq!(report.run.failed, 20);
    let errors: Vec<_> = report.paths.iter().flat_map(|p| p.errors.iter()).collect();
    assert_eq!(errors.len(), 20);
    assert!(errors.iter().all(|e| e.url.starts_with(&base)));
    assert!(errors.iter().all(|e| e.kind == FailureKind::Transport));
}

/// Answers by path without touching the network.
struct ScriptedTransport {
    statuses: BTreeMap<&'static str, u16>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<u16, RequestError> {
        for (suffix, status) in self.statuses.iter() {
            if url.ends_with(suffix) {
                return Ok(*status);
            }
        }
        Err(RequestError::Transport {
            cause: "connection reset".to_string(),
        })
    }
}

#[tokio::test]
async fn server_errors_are_neither_blocked_nor_allowed() {
    let catalog = PathCatalog::with_random_paths(&["index.html"], Vec::new());
    let transport = Arc::new(ScriptedTransport {
        statuses: BTreeMap::from([
            ("index.html", 200),
            ("/admin", 500),
            ("/.env", 403),
            ("/robots.txt", 200),
        ]),
    });
    let runner = Runner::new(Options {
        include_security: true,
        ..options_for("http://target.test", 2000, 8)
    })
    .unwrap();

    let result = runner
        .run_with(transport, &catalog, &ProgressBar::hidden())
        .await;
    let report = &result.report;

    assert_eq!(report.run.completed, 2000);
    let rows = report.security.as_ref().unwrap();
    let malicious = rows
        .iter()
        .find(|r| r.category == catalog::MALICIOUS_PATHS_GROUP)
        .unwrap();
    assert!(malicious.blocked > 0);
    assert!(malicious.allowed > 0);
    assert!(malicious.errors > 0);
    assert!(malicious.blocked + malicious.allowed + malicious.errors < malicious.total);

    let admin = report.path("/admin").unwrap();
    assert_eq!(admin.status_counts.keys().copied().collect::<Vec<_>>(), vec![500]);
}

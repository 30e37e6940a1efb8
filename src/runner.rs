use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use thiserror::Error;
use tokio::time::Instant;

use crate::catalog::{self, PathCatalog};
use crate::dispatcher::{
    DispatchConfig, DispatchStrategy, HttpTransport, HttpTransportConfig, RequestDispatcher,
    Transport,
};
use crate::report::{self, ReportModel, RunInfo};
use crate::store::{self, ResultStore};

pub const DEFAULT_URL: &str = "http://localhost:8270";
pub const DEFAULT_REQUESTS: usize = 1000;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT_SECONDS: usize = 10;

#[derive(Clone, Debug)]
pub struct Options {
    pub url: String,
    pub pages: Vec<String>,
    pub requests: usize,
    pub concurrency: usize,
    pub include_security: bool,
    pub random_path_count: usize,
    pub timeout_seconds: usize,
    pub rate: Option<u32>,
    pub strategy: DispatchStrategy,
    pub follow_redirects: bool,
    pub max_errors_per_path: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            pages: catalog::payloads::VALID_PAGES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            requests: DEFAULT_REQUESTS,
            concurrency: DEFAULT_CONCURRENCY,
            include_security: false,
            random_path_count: catalog::DEFAULT_RANDOM_PATH_COUNT,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            rate: None,
            strategy: DispatchStrategy::default(),
            follow_redirects: false,
            max_errors_per_path: store::DEFAULT_MAX_ERRORS_PER_PATH,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid concurrency {value}, expected positive integer")]
    InvalidConcurrency { value: usize },

    #[error("invalid timeout {value}, expected positive integer")]
    InvalidTimeout { value: usize },

    #[error("invalid rate {value}, expected positive integer")]
    InvalidRate { value: u32 },

    #[error("request pool is empty (no pages and security mode disabled)")]
    EmptyPool,

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Clone, Debug)]
pub struct RunResult {
    pub report: ReportModel,
    pub elapsed: Duration,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
    base_url: String,
    rate: Option<NonZeroU32>,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        let trimmed = options.url.trim();
        if reqwest::Url::parse(trimmed).is_err() {
            return Err(RunnerError::InvalidUrl {
                url: options.url.clone(),
            });
        }
        if options.concurrency == 0 {
            return Err(RunnerError::InvalidConcurrency {
                value: options.concurrency,
            });
        }
        if options.timeout_seconds == 0 {
            return Err(RunnerError::InvalidTimeout {
                value: options.timeout_seconds,
            });
        }
        let rate = match options.rate {
            Some(value) => {
                Some(NonZeroU32::new(value).ok_or(RunnerError::InvalidRate { value })?)
            }
            None => None,
        };
        if options.pages.is_empty() && !options.include_security {
            return Err(RunnerError::EmptyPool);
        }
        let base_url = trimmed.trim_end_matches('/').to_string();
        Ok(Self {
            options,
            base_url,
            rate,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Target with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_catalog(&self) -> PathCatalog {
        let random_count = if self.options.include_security {
            self.options.random_path_count
        } else {
            0
        };
        PathCatalog::new(self.options.pages.as_slice(), random_count)
    }

    pub fn build_transport(&self) -> Result<HttpTransport, RunnerError> {
        HttpTransport::new(&HttpTransportConfig {
            pool_size: self.options.concurrency,
            timeout: self.timeout(),
            follow_redirects: self.options.follow_redirects,
        })
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.options.timeout_seconds.try_into().unwrap_or(10))
    }

    pub async fn run(&self) -> Result<RunResult, RunnerError> {
        self.run_with_progress(&ProgressBar::hidden()).await
    }

    pub async fn run_with_progress(&self, pb: &ProgressBar) -> Result<RunResult, RunnerError> {
        let transport = Arc::new(self.build_transport()?);
        let catalog = self.build_catalog();
        Ok(self.run_with(transport, &catalog, pb).await)
    }

    /// Run against an explicit transport and catalog.
    pub async fn run_with(
        &self,
        transport: Arc<dyn Transport>,
        catalog: &PathCatalog,
        pb: &ProgressBar,
    ) -> RunResult {
        let started_at = Instant::now();
        let pool = Arc::new(catalog.expand(self.options.include_security));
        let store = ResultStore::new(self.options.max_errors_per_path);

        let dispatcher = RequestDispatcher::new(
            transport,
            store.clone(),
            DispatchConfig {
                base_url: self.base_url.clone(),
                requests: self.options.requests,
                concurrency: self.options.concurrency,
                timeout: self.timeout(),
                rate: self.rate,
                strategy: self.options.strategy,
            },
        );
        dispatcher.run(pool, pb).await;

        let elapsed = started_at.elapsed();
        let records = store.snapshot_all().await;
        let run = RunInfo::new(
            &self.base_url,
            self.options.requests,
            self.options.concurrency,
            self.options.include_security,
            self.options.strategy,
            elapsed,
            &records,
        );
        RunResult {
            report: report::build_report(catalog, &records, run),
            elapsed,
        }
    }
}

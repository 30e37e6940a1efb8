pub mod gate;
pub mod transport;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use governor::{Quota, RateLimiter};
use indicatif::ProgressBar;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task;
use tokio::time::Instant;

use crate::store::{ErrorDescriptor, FailureKind, RequestOutcome, ResultStore};

pub use gate::{AdmissionGate, GatePass};
pub use transport::{HttpTransport, HttpTransportConfig, Transport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// shared queue slots per worker for the pool strategy
const QUEUE_DEPTH_PER_WORKER: usize = 16;

/// Why a single attempt failed. Never escapes the dispatcher: every variant is
/// turned into an [`ErrorDescriptor`] and recorded.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request timed out after {}ms", .after.as_millis())]
    Elapsed { after: Duration },

    #[error("timeout: {cause}")]
    Timeout { cause: String },

    #[error("{cause}")]
    Transport { cause: String },

    #[error("invalid request url: {cause}")]
    InvalidUrl { cause: String },

    #[error("admission gate closed")]
    GateClosed,
}

impl RequestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RequestError::Elapsed { .. } | RequestError::Timeout { .. } => FailureKind::Timeout,
            _ => FailureKind::Transport,
        }
    }

    pub fn describe(&self, url: &str) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind(),
            cause: self.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// `concurrency` long-lived workers pulling draws from their queues.
    #[default]
    WorkerPool,
    /// Launch `2 * concurrency` requests, wait for all of them, repeat.
    Waves,
}

impl DispatchStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pool" | "worker-pool" | "workers" => Some(Self::WorkerPool),
            "waves" | "wave" | "batch" => Some(Self::Waves),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DispatchStrategy::WorkerPool => "pool",
            DispatchStrategy::Waves => "waves",
        }
    }
}

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Target without a trailing slash.
    pub base_url: String,
    pub requests: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    pub rate: Option<NonZeroU32>,
    pub strategy: DispatchStrategy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchSummary {
    pub dispatched: usize,
    pub peak_in_flight: usize,
}

// everything one attempt needs, cheap to clone into spawned tasks
#[derive(Clone)]
struct AttemptContext {
    transport: Arc<dyn Transport>,
    store: ResultStore,
    gate: AdmissionGate,
    base_url: Arc<str>,
    timeout: Duration,
}

impl AttemptContext {
    async fn attempt(&self, path: String) {
        let url = format!("{}/{}", self.base_url, path);
        let outcome = match self.gate.admit().await {
            Ok(pass) => {
                let started = Instant::now();
                let result = tokio::time::timeout(self.timeout, self.transport.get(&url)).await;
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                drop(pass);
                match result {
                    Ok(Ok(status)) => RequestOutcome::success(path, latency_ms, status),
                    Ok(Err(e)) => {
                        tracing::debug!(%url, error = %e, "request failed");
                        RequestOutcome::failure(path, e.describe(&url))
                    }
                    Err(_) => {
                        let e = RequestError::Elapsed {
                            after: self.timeout,
                        };
                        tracing::debug!(%url, "request timed out");
                        RequestOutcome::failure(path, e.describe(&url))
                    }
                }
            }
            Err(e) => RequestOutcome::failure(path, e.describe(&url)),
        };
        self.store.record(outcome).await;
    }
}

/// Drains a path pool against one target under a fixed concurrency bound.
pub struct RequestDispatcher {
    ctx: AttemptContext,
    config: DispatchConfig,
}

impl RequestDispatcher {
    pub fn new(transport: Arc<dyn Transport>, store: ResultStore, config: DispatchConfig) -> Self {
        let gate = AdmissionGate::new(config.concurrency);
        let base_url: Arc<str> = Arc::from(config.base_url.trim_end_matches('/'));
        Self {
            ctx: AttemptContext {
                transport,
                store,
                gate,
                base_url,
                timeout: config.timeout,
            },
            config,
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.ctx.gate
    }

    pub fn store(&self) -> &ResultStore {
        &self.ctx.store
    }

    /// Perform `config.requests` attempts, each against a path drawn
    /// uniformly from `pool`. Returns once every outcome is recorded.
    pub async fn run(&self, pool: Arc<Vec<String>>, pb: &ProgressBar) -> DispatchSummary {
        if pool.is_empty() || self.config.requests == 0 {
            tracing::debug!(
                pool = pool.len(),
                requests = self.config.requests,
                "nothing to dispatch"
            );
            return DispatchSummary {
                dispatched: 0,
                peak_in_flight: 0,
            };
        }

        tracing::info!(
            target_url = %self.ctx.base_url,
            requests = self.config.requests,
            concurrency = self.ctx.gate.capacity(),
            strategy = self.config.strategy.label(),
            "dispatch started"
        );

        let dispatched = match self.config.strategy {
            DispatchStrategy::WorkerPool => self.run_worker_pool(pool, pb).await,
            DispatchStrategy::Waves => self.run_waves(pool, pb).await,
        };

        let summary = DispatchSummary {
            dispatched,
            peak_in_flight: self.ctx.gate.peak(),
        };
        tracing::info!(
            dispatched = summary.dispatched,
            peak_in_flight = summary.peak_in_flight,
            "dispatch finished"
        );
        summary
    }

    async fn run_worker_pool(&self, pool: Arc<Vec<String>>, pb: &ProgressBar) -> usize {
        let worker_count = self.ctx.gate.capacity().min(self.config.requests);
        // single queue drained by every worker
        let (tx, rx) = mpsc::channel::<String>(worker_count * QUEUE_DEPTH_PER_WORKER);
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = FuturesUnordered::new();
        for _ in 0..worker_count {
            let rx = rx.clone();
            let ctx = self.ctx.clone();
            let wpb = pb.clone();
            workers.push(task::spawn(async move {
                let mut done = 0usize;
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(path) = next else { break };
                    ctx.attempt(path).await;
                    wpb.inc(1);
                    done += 1;
                }
                done
            }));
        }

        let requests = self.config.requests;
        let rate = self.config.rate;
        let feeder = task::spawn(async move {
            let lim = rate.map(|r| RateLimiter::direct(Quota::per_second(r)));
            for _ in 0..requests {
                if let Some(lim) = lim.as_ref() {
                    lim.until_ready().await;
                }
                if tx.send(draw(&pool)).await.is_err() {
                    tracing::warn!("request queue closed early");
                    break;
                }
            }
        });

        if let Err(e) = feeder.await {
            tracing::warn!(error = %e, "request feeder failed");
        }

        let mut dispatched = 0usize;
        while let Some(joined) = workers.next().await {
            match joined {
                Ok(done) => dispatched += done,
                Err(e) => tracing::warn!(error = %e, "dispatch worker failed"),
            }
        }
        dispatched
    }

    async fn run_waves(&self, pool: Arc<Vec<String>>, pb: &ProgressBar) -> usize {
        let wave_size = self.ctx.gate.capacity() * 2;
        let lim = self
            .config
            .rate
            .map(|r| RateLimiter::direct(Quota::per_second(r)));

        let mut remaining = self.config.requests;
        let mut dispatched = 0usize;
        let mut wave_no = 0usize;
        while remaining > 0 {
            let this_wave = remaining.min(wave_size);
            let wave: FuturesUnordered<_> = FuturesUnordered::new();
            for _ in 0..this_wave {
                if let Some(lim) = lim.as_ref() {
                    lim.until_ready().await;
                }
                let ctx = self.ctx.clone();
                let path = draw(&pool);
                wave.push(task::spawn(async move { ctx.attempt(path).await }));
            }

            let joined: Vec<_> = wave.collect().await;
            for j in joined.iter() {
                if let Err(e) = j {
                    tracing::warn!(error = %e, "wave member failed");
                }
            }
            dispatched += joined.iter().filter(|j| j.is_ok()).count();
            pb.inc(this_wave as u64);
            wave_no += 1;
            tracing::debug!(wave = wave_no, size = this_wave, "wave completed");
            remaining -= this_wave;
        }
        dispatched
    }
}

fn draw(pool: &[String]) -> String {
    let idx = rand::thread_rng().gen_range(0..pool.len());
    pool[idx].clone()
}

// src/health/checker.rs
use super::probe::{HttpProbe, Probe};
use super::status::{Category, Status};
use crate::config::CheckConfig;
use crate::registry::Endpoint;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Upper bound on probes in flight during one run.
const MAX_IN_FLIGHT: usize = 16;

/// Outcome for one endpoint in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub endpoint: Endpoint,
    pub status: Status,
}

/// Results of one run, in the same order as the input endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckBatch {
    results: Vec<CheckResult>,
}

/// Per-category counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub healthy: usize,
    pub unhealthy: usize,
    pub neutral: usize,
    pub unreachable: usize,
}

impl CheckBatch {
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CheckResult> {
        self.results.iter()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for result in &self.results {
            match result.status.category() {
                Category::Healthy => summary.healthy += 1,
                Category::Unhealthy => summary.unhealthy += 1,
                Category::Neutral => summary.neutral += 1,
                Category::Unreachable => summary.unreachable += 1,
            }
        }
        summary
    }
}

impl<'a> IntoIterator for &'a CheckBatch {
    type Item = &'a CheckResult;
    type IntoIter = std::slice::Iter<'a, CheckResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for CheckBatch {
    type Item = CheckResult;
    type IntoIter = std::vec::IntoIter<CheckResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} healthy, {} unhealthy, {} other, {} unreachable",
            self.healthy, self.unhealthy, self.neutral, self.unreachable
        )
    }
}

/// Probes a batch of endpoints and reports one status per endpoint.
pub struct HealthChecker {
    probe: Arc<dyn Probe>,
}

impl HealthChecker {
    /// Checker backed by real HTTP probes bounded by `config.timeout`.
    pub fn new(config: CheckConfig) -> Result<Self> {
        Ok(Self::with_probe(Arc::new(HttpProbe::new(config)?)))
    }

    pub fn with_probe(probe: Arc<dyn Probe>) -> Self {
        Self { probe }
    }

    /// Probe every endpoint. The i-th result always belongs to the i-th
    /// endpoint, whatever order the probes finish in.
    pub async fn check_all(&self, endpoints: &[Endpoint]) -> CheckBatch {
        let span = info_span!("check_run", run_id = %Uuid::new_v4(), endpoints = endpoints.len());

        async move {
            let mut slots: Vec<Option<Status>> = vec![None; endpoints.len()];

            let mut completed = stream::iter(endpoints.iter().enumerate())
                .map(|(index, endpoint)| {
                    let probe = self.probe.clone();
                    async move { (index, probe.probe(&endpoint.url).await) }
                })
                .buffer_unordered(MAX_IN_FLIGHT);

            while let Some((index, status)) = completed.next().await {
                debug!(
                    name = %endpoints[index].name,
                    url = %endpoints[index].url,
                    %status,
                    "Endpoint checked"
                );
                slots[index] = Some(status);
            }

            let results: Vec<CheckResult> = endpoints
                .iter()
                .zip(slots)
                .map(|(endpoint, status)| CheckResult {
                    endpoint: endpoint.clone(),
                    status: status.expect("every endpoint is probed exactly once"),
                })
                .collect();

            let batch = CheckBatch { results };
            info!("Health check complete: {}", batch.summary());
            batch
        }
        .instrument(span)
        .await
    }

    /// Like [`check_all`](Self::check_all) but gives up as soon as `shutdown`
    /// flips to `true`. A cancelled run yields no batch and drops in-flight
    /// probes.
    pub async fn check_all_until(
        &self,
        endpoints: &[Endpoint],
        mut shutdown: watch::Receiver<bool>,
    ) -> Option<CheckBatch> {
        if *shutdown.borrow() {
            return None;
        }

        tokio::select! {
            batch = self.check_all(endpoints) => Some(batch),
            _ = wait_for_shutdown(&mut shutdown) => {
                info!("Health check cancelled");
                None
            }
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if shutdown.changed().await.is_err() {
            // sender gone, nobody can cancel any more
            std::future::pending::<()>().await;
        }
        if *shutdown.borrow() {
            return;
        }
    }
}

// src/health/probe.rs
use super::status::Status;
use crate::config::CheckConfig;
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::time::Instant;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

/// A single bounded attempt to reach a URL.
///
/// Implementations are total: every failure is folded into
/// [`Status::Unreachable`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> Status;
}

/// Issues one HTTP GET per call, never retries.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    config: CheckConfig,
    client: Client,
}

impl HttpProbe {
    pub fn new(config: CheckConfig) -> anyhow::Result<Self> {
        // Redirects are not followed so a 301 is reported as such.
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> Status {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(e) => {
                debug!(%url, error = %e, "Malformed URL");
                return Status::Unreachable;
            }
        };

        let start = Instant::now();
        let result = timeout(self.config.timeout, self.client.get(url.as_str()).send()).await;
        let elapsed = start.elapsed();

        match result {
            Ok(Ok(response)) => {
                let status = Status::from_code(response.status().as_u16());
                debug!(%url, %status, ?elapsed, "Probe answered");
                status
            }
            Ok(Err(e)) => {
                debug!(%url, error = %e, ?elapsed, "Probe failed");
                Status::Unreachable
            }
            Err(_) => {
                debug!(%url, ?elapsed, "Probe timed out");
                Status::Unreachable
            }
        }
    }
}

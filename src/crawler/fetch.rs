//! Fetch pipeline with ordered fallback strategies
//!
//! This module handles page retrieval for the crawler:
//! - A `FetchStrategy` trait over heterogeneous HTTP clients
//! - Concrete strategies (pooled async client, blocking client, minimal client)
//! - A pipeline that tries strategies in priority order until one yields
//!   non-empty content

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors a fetch strategy can produce
///
/// The pipeline treats every variant as "this strategy yielded nothing" and
/// moves on to the next strategy.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Blocking fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One method of retrieving page content for a URL
///
/// Each strategy configures connect/read timeouts on its own client; the
/// pipeline imposes no additional timeout, so a full pass is bounded by the
/// sum of per-strategy timeouts.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Fetches the response body for `url`
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;

    /// Strategy name, for logging
    fn name(&self) -> &'static str;
}

/// Primary strategy: shared pooled async client
///
/// Follows redirects, negotiates gzip/brotli, reuses connections.
pub struct AsyncClientStrategy {
    client: reqwest::Client,
}

impl AsyncClientStrategy {
    pub fn new(user_agent: &str, config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FetchStrategy for AsyncClientStrategy {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    fn name(&self) -> &'static str {
        "async-client"
    }
}

/// Secondary strategy: blocking client driven off the async runtime
///
/// The blocking client cannot be constructed or used on a runtime worker
/// thread, so both happen inside `spawn_blocking`.
pub struct BlockingClientStrategy {
    user_agent: String,
    request_timeout: Duration,
    connect_timeout: Duration,
}

impl BlockingClientStrategy {
    pub fn new(user_agent: &str, config: &FetchConfig) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl FetchStrategy for BlockingClientStrategy {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = url.to_string();
        let user_agent = self.user_agent.clone();
        let request_timeout = self.request_timeout;
        let connect_timeout = self.connect_timeout;

        tokio::task::spawn_blocking(move || {
            let client = reqwest::blocking::Client::builder()
                .user_agent(user_agent)
                .timeout(request_timeout)
                .connect_timeout(connect_timeout)
                .build()?;

            let response = client.get(&url).send()?;
            let status = response.status();

            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            Ok(response.text()?)
        })
        .await?
    }

    fn name(&self) -> &'static str {
        "blocking-client"
    }
}

/// Last-resort strategy: bare client, plain GET
///
/// No redirects, no content negotiation. Some servers that choke on the
/// richer clients still answer this one.
pub struct MinimalClientStrategy {
    client: reqwest::Client,
}

impl MinimalClientStrategy {
    pub fn new(user_agent: &str, config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::none())
            .no_gzip()
            .no_brotli()
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FetchStrategy for MinimalClientStrategy {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    fn name(&self) -> &'static str {
        "minimal-client"
    }
}

/// Ordered fallback chain over fetch strategies
///
/// Strategies are tried in the order given; the first non-empty body wins.
/// Adding or removing a strategy never touches the crawl loop.
pub struct FetchPipeline {
    strategies: Vec<Arc<dyn FetchStrategy>>,
}

impl FetchPipeline {
    /// Creates a pipeline from an explicit strategy order
    pub fn new(strategies: Vec<Arc<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Builds the default strategy stack: async client, then blocking
    /// client, then minimal client
    pub fn with_default_strategies(
        user_agent: &str,
        config: &FetchConfig,
    ) -> Result<Self, FetchError> {
        Ok(Self::new(vec![
            Arc::new(AsyncClientStrategy::new(user_agent, config)?),
            Arc::new(BlockingClientStrategy::new(user_agent, config)),
            Arc::new(MinimalClientStrategy::new(user_agent, config)?),
        ]))
    }

    /// Fetches `url`, returning the first non-empty body any strategy yields
    ///
    /// A strategy that errors or returns an empty body falls through to the
    /// next one. When every strategy is exhausted the result is an empty
    /// string, never an error: callers skip extraction and link discovery
    /// for the page and keep the task alive.
    pub async fn fetch(&self, url: &str) -> String {
        for strategy in &self.strategies {
            match strategy.fetch(url).await {
                Ok(body) if !body.is_empty() => {
                    tracing::debug!(
                        "{} fetched {} ({} bytes)",
                        strategy.name(),
                        url,
                        body.len()
                    );
                    return body;
                }
                Ok(_) => {
                    tracing::debug!("{} returned empty body for {}", strategy.name(), url);
                }
                Err(e) => {
                    tracing::debug!("{} failed for {}: {}", strategy.name(), url, e);
                }
            }
        }

        tracing::warn!("All fetch strategies exhausted for {}", url);
        String::new()
    }

    /// Number of configured strategies
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }
}

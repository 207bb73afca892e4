//! Geodata fetcher
//!
//! This module executes one bounding-box query against the endpoint pool,
//! including:
//! - Round-robin endpoint rotation per attempt
//! - Deadline enforcement (query timeout plus a safety margin)
//! - Rate-limit-aware linear backoff
//! - Error classification into retryable and terminal failures

use crate::config::CrawlConfig;
use crate::crawler::query::build_query;
use crate::grid::BoundingBox;
use crate::place::{OverpassEnvelope, RawElement};
use crate::{ConfigError, HarvestError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Added to the server-side query timeout to form the client deadline, so
/// the server gets the chance to answer with its own timeout error first.
const TIMEOUT_SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// Marker some interpreters put in error bodies instead of a 429 status.
const RATE_LIMIT_MARKER: &str = "rate_limited";

/// Bounded retry policy: attempt ceiling plus a linear backoff.
///
/// Linear rather than exponential: the pool is a handful of shared public
/// endpoints, and doubling delays would push a 6-attempt fetch past any
/// practical run time.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before the attempt following `attempt` (1-indexed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// How a single fetch attempt failed.
#[derive(Debug, Error)]
enum AttemptFailure {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("HTTP {status}")]
    BadStatus { status: StatusCode, body: String },

    #[error("response parse failed: {message}")]
    Parse { message: String },
}

impl AttemptFailure {
    fn is_rate_limited(&self) -> bool {
        match self {
            Self::BadStatus { status, body } => {
                *status == StatusCode::TOO_MANY_REQUESTS || body.contains(RATE_LIMIT_MARKER)
            }
            _ => false,
        }
    }
}

/// Fetches raw elements for one bounding box at a time.
pub struct OverpassFetcher {
    client: Client,
    endpoints: Vec<String>,
    policy: RetryPolicy,
    query_timeout: Duration,
}

impl OverpassFetcher {
    /// Builds a fetcher from the crawl configuration.
    ///
    /// An empty endpoint pool is a configuration error, caught here before
    /// any attempt is made.
    pub fn new(config: &CrawlConfig) -> crate::Result<Self> {
        let endpoints = config.endpoint_pool();
        if endpoints.is_empty() {
            return Err(ConfigError::Validation("endpoint pool is empty".to_string()).into());
        }

        let client = Client::builder()
            .user_agent(concat!("placewalk/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            policy: RetryPolicy::new(config.max_retries, config.base_delay()),
            query_timeout: config.query_timeout(),
        })
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Endpoint serving the given attempt (1-indexed), rotating round-robin
    /// through the pool.
    pub fn endpoint_for_attempt(&self, attempt: u32) -> &str {
        debug_assert!(attempt >= 1);
        let index = (attempt as usize - 1) % self.endpoints.len();
        &self.endpoints[index]
    }

    /// Fetches all matching elements within `bbox`.
    ///
    /// Transient failures (transport errors, rate limiting, unparsable
    /// bodies) are retried with linear backoff up to the attempt ceiling;
    /// whatever failure stands at the ceiling becomes the run-fatal error.
    pub async fn fetch(&self, bbox: &BoundingBox) -> crate::Result<Vec<RawElement>> {
        let query = build_query(bbox, self.query_timeout);
        let deadline = self.query_timeout + TIMEOUT_SAFETY_MARGIN;
        let max = self.policy.max_attempts;

        for attempt in 1..=max {
            let endpoint = self.endpoint_for_attempt(attempt);

            let failure = match self.attempt(endpoint, &query, deadline).await {
                Ok(elements) => return Ok(elements),
                Err(failure) => failure,
            };

            let last = attempt == max;
            let rate_limited = failure.is_rate_limited();
            tracing::warn!(
                "fetch attempt {}/{} via {} failed: {}",
                attempt,
                max,
                endpoint,
                failure
            );

            match failure {
                AttemptFailure::Transport(source) if last => {
                    return Err(HarvestError::Transport {
                        bbox: *bbox,
                        endpoint: endpoint.to_string(),
                        source,
                    });
                }
                AttemptFailure::BadStatus { status, body } if last && !rate_limited => {
                    return Err(HarvestError::Endpoint {
                        bbox: *bbox,
                        endpoint: endpoint.to_string(),
                        status: status.as_u16(),
                        body: snippet(&body, 200),
                    });
                }
                _ => {}
            }

            if !last {
                tokio::time::sleep(self.policy.backoff(attempt)).await;
            }
        }

        Err(HarvestError::FetchExhausted {
            bbox: *bbox,
            attempts: max,
        })
    }

    async fn attempt(
        &self,
        endpoint: &str,
        query: &str,
        deadline: Duration,
    ) -> Result<Vec<RawElement>, AttemptFailure> {
        let response = self
            .client
            .post(endpoint)
            .timeout(deadline)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query.to_string())
            .send()
            .await
            .map_err(AttemptFailure::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(AttemptFailure::Transport)?;

        if status.is_success() {
            return match serde_json::from_str::<OverpassEnvelope>(&body) {
                Ok(envelope) => Ok(envelope.elements),
                Err(e) => {
                    tracing::warn!(
                        "unparsable response body (starts: {:?})",
                        snippet(&body, 120)
                    );
                    Err(AttemptFailure::Parse {
                        message: e.to_string(),
                    })
                }
            };
        }

        Err(AttemptFailure::BadStatus { status, body })
    }
}

fn snippet(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        let prefix: String = body.chars().take(max_chars).collect();
        format!("{prefix}...")
    }
}

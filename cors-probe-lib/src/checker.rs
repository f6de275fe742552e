//! Main CORS checker implementation.
//!
//! `CorsChecker` owns the scan configuration and a single HTTP client. It
//! probes one URL at a time with `check_url`, or drains a whole URL stream
//! through a worker pool with `scan`.

use crate::concurrent::ConcurrentProcessor;
use crate::error::CorsProbeError;
use crate::origins::origin_candidates;
use crate::types::{CheckConfig, Finding, ScanSummary};
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, COOKIE, ORIGIN};
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::debug;

/// Probes URLs for CORS origin reflection.
///
/// Cloning is cheap: the HTTP client is reference counted and the
/// configuration is shared, so each worker gets its own handle.
///
/// # Example
///
/// ```rust,no_run
/// use cors_probe_lib::{CheckConfig, CorsChecker};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = CorsChecker::with_config(CheckConfig::default().with_domain("example.com"))?;
///     if let Some(finding) = checker.check_url("https://api.example.com/").await? {
///         println!("{}", finding);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CorsChecker {
    config: Arc<CheckConfig>,
    http_client: reqwest::Client,
}

impl CorsChecker {
    /// Create a checker with default configuration.
    pub fn new() -> Result<Self, CorsProbeError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with custom configuration.
    ///
    /// A zero `config.timeout` leaves requests without a time limit.
    ///
    /// # Errors
    ///
    /// Returns `CorsProbeError::NetworkError` if the HTTP client cannot be
    /// built (for example when the TLS backend fails to initialise).
    pub fn with_config(config: CheckConfig) -> Result<Self, CorsProbeError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if !config.timeout.is_zero() {
            builder = builder.timeout(config.timeout);
        }
        let http_client = builder.build()
            .map_err(|e| {
                CorsProbeError::network_with_source("Failed to create HTTP client", e.to_string())
            })?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Get the configuration this checker was built with.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Probe a single URL with every origin candidate, in order.
    ///
    /// Stops at the first candidate echoed back verbatim in
    /// `Access-Control-Allow-Origin` and returns it as a `Finding`. A
    /// candidate whose request fails (connection error, timeout) is skipped.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no candidate was reflected.
    ///
    /// # Errors
    ///
    /// Returns `CorsProbeError::InvalidUrl` if `url` cannot be parsed; no
    /// request is sent in that case.
    pub async fn check_url(&self, url: &str) -> Result<Option<Finding>, CorsProbeError> {
        let target =
            Url::parse(url).map_err(|e| CorsProbeError::invalid_url(url, e.to_string()))?;

        for origin in origin_candidates(&self.config.domain) {
            let mut request = self
                .http_client
                .get(target.clone())
                .header(ORIGIN, origin.as_str());
            if let Some(cookies) = &self.config.cookies {
                request = request.header(COOKIE, cookies.as_str());
            }

            let mut response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let err = CorsProbeError::request(e, self.config.timeout);
                    debug!(url, origin = %origin, "skipping candidate: {}", err);
                    continue;
                }
            };

            let reflected = response
                .headers()
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_some_and(|value| value.as_bytes() == origin.as_bytes());

            // Drain the body chunk by chunk so the connection goes back to the pool.
            loop {
                match response.chunk().await {
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(e) => {
                        debug!(url, "failed to read response body: {}", e);
                        break;
                    }
                }
            }

            if reflected {
                return Ok(Some(Finding {
                    url: url.to_string(),
                    origin,
                }));
            }
        }

        Ok(None)
    }

    /// Probe every line of `input` concurrently.
    ///
    /// Lines are handed to `config.concurrency` workers; each finding is sent
    /// on `findings` as soon as it is discovered. Lines that are not valid
    /// URLs are skipped. Returns when the input is exhausted and all
    /// workers have finished.
    pub async fn scan<R>(&self, input: R, findings: mpsc::UnboundedSender<Finding>) -> ScanSummary
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let found = Arc::new(AtomicUsize::new(0));
        let processor = ConcurrentProcessor::new(self.config.concurrency);

        let checker = self.clone();
        let counter = Arc::clone(&found);
        let stats = processor
            .run(input, move |url| {
                let checker = checker.clone();
                let findings = findings.clone();
                let counter = Arc::clone(&counter);
                async move {
                    match checker.check_url(&url).await {
                        Ok(Some(finding)) => {
                            counter.fetch_add(1, Ordering::Relaxed);
                            // The receiver may have been dropped; the scan still completes.
                            let _ = findings.send(finding);
                        }
                        Ok(None) => {}
                        Err(e) => debug!("skipping URL: {}", e),
                    }
                }
            })
            .await;

        let summary = ScanSummary {
            lines_read: stats.produced,
            urls_processed: stats.processed,
            findings: found.load(Ordering::Relaxed),
            workers: stats.workers,
        };
        debug!(?summary, "scan complete");
        summary
    }
}

//! Core data types for CORS probing.
//!
//! This module defines the scan configuration shared by every worker,
//! the finding emitted for a reflected origin, and the summary returned
//! once a scan has drained its input.

use std::fmt;
use std::time::Duration;

/// Browser-like User-Agent sent with every probe request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/74.0.3729.169 Safari/537.36";

/// Configuration options for a scan.
///
/// Built once at startup and never mutated afterwards; every worker reads
/// the same values.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    /// Number of workers draining the URL queue
    /// Default: 10, Minimum: 1
    pub concurrency: usize,

    /// Timeout for each individual probe request
    /// Default: 5 seconds, zero means no limit
    pub timeout: Duration,

    /// Domain substituted into the crafted origin candidates
    /// Default: empty
    pub domain: String,

    /// Raw `Cookie` header value sent with every request
    /// Default: none
    pub cookies: Option<String>,

    /// `User-Agent` header value sent with every request
    pub user_agent: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(5),
            domain: String::new(),
            cookies: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckConfig {
    /// Set the worker pool size. Values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the domain used to build origin candidates.
    pub fn with_domain<D: Into<String>>(mut self, domain: D) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the cookie string. An empty string clears it.
    pub fn with_cookies<C: Into<String>>(mut self, cookies: C) -> Self {
        let cookies = cookies.into();
        self.cookies = if cookies.is_empty() {
            None
        } else {
            Some(cookies)
        };
        self
    }

    /// Override the User-Agent header.
    pub fn with_user_agent<U: Into<String>>(mut self, user_agent: U) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// A URL whose server trusted one of the crafted origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The URL exactly as it appeared in the input
    pub url: String,

    /// The origin candidate echoed back in `Access-Control-Allow-Origin`
    pub origin: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.url, self.origin)
    }
}

/// Counters collected over one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Lines read from the input and pushed onto the queue
    pub lines_read: usize,

    /// URLs taken off the queue by workers
    pub urls_processed: usize,

    /// Findings emitted
    pub findings: usize,

    /// Workers that ran to completion
    pub workers: usize,
}

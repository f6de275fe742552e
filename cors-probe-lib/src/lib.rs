//! # CORS Probe Library
//!
//! Finds URLs whose servers trust attacker-controlled origins. Each URL is
//! requested with a fixed sequence of crafted `Origin` headers; the first
//! one echoed back verbatim in `Access-Control-Allow-Origin` is reported.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cors_probe_lib::{open_input, CheckConfig, CorsChecker};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CheckConfig::default().with_domain("example.com");
//!     let checker = CorsChecker::with_config(config)?;
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     let printer = tokio::spawn(async move {
//!         while let Some(finding) = rx.recv().await {
//!             println!("{}", finding);
//!         }
//!     });
//!
//!     let input = open_input(None).await?;
//!     checker.scan(input, tx).await;
//!     printer.await?;
//!     Ok(())
//! }
//! ```

// Re-export main public API types and functions
pub use checker::CorsChecker;
pub use concurrent::{ConcurrentProcessor, PoolStats};
pub use config::{parse_timeout_string, DefaultsConfig, FileConfig};
pub use error::CorsProbeError;
pub use input::{open_input, InputSource};
pub use origins::{origin_candidates, CANDIDATE_COUNT};
pub use types::{CheckConfig, Finding, ScanSummary, DEFAULT_USER_AGENT};

mod checker;
mod concurrent;
mod config;
mod error;
mod input;
mod origins;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, CorsProbeError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

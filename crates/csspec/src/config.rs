//! Run configuration.
//!
//! Settings can be loaded from environment variables or constructed programmatically.

use core::time::Duration;
use std::env;

/// Fixture used when none is configured.
pub const DEFAULT_FIXTURE_SELECTOR: &str = "#csspec-fixture";

/// Upper bound for fetching one external stylesheet, in milliseconds.
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// How a finished run is written out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    /// Parse `text` or `json`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Runtime configuration for a test run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsspecConfig {
    /// Selector of the element test cases are applied to
    pub fixture_selector: String,
    /// Timeout for fetching each external stylesheet in milliseconds
    pub load_timeout_ms: u64,
    /// Output format of the report
    pub report: ReportFormat,
}

impl Default for CsspecConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_SELECTOR, DEFAULT_LOAD_TIMEOUT_MS, ReportFormat::Text)
    }
}

impl CsspecConfig {
    /// Construct a config with explicit values. The timeout is at least 1ms.
    #[must_use]
    pub fn new(fixture_selector: &str, load_timeout_ms: u64, report: ReportFormat) -> Self {
        Self {
            fixture_selector: fixture_selector.to_owned(),
            load_timeout_ms: load_timeout_ms.max(1),
            report,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `CSSPEC_FIXTURE_SELECTOR`: fixture selector (default: `#csspec-fixture`)
    /// - `CSSPEC_LOAD_TIMEOUT_MS`: stylesheet fetch timeout (default: 30000)
    /// - `CSSPEC_REPORT`: `text` or `json` (default: text)
    ///
    /// Unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let fixture_selector = env::var("CSSPEC_FIXTURE_SELECTOR")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FIXTURE_SELECTOR.to_owned());
        let load_timeout_ms = env::var("CSSPEC_LOAD_TIMEOUT_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_LOAD_TIMEOUT_MS);
        let report = env::var("CSSPEC_REPORT")
            .ok()
            .and_then(|val| ReportFormat::parse(&val))
            .unwrap_or_default();
        Self::new(&fixture_selector, load_timeout_ms, report)
    }

    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

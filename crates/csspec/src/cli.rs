//! CLI argument parsing with clap derive.

use clap::{Parser, ValueEnum};
use csspec::{CsspecConfig, ReportFormat};

/// Run the CSS specifications of a page against its fixture
#[derive(Parser)]
#[command(name = "csspec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Page to test, as a URL or a path
    #[arg(value_name = "PAGE")]
    pub page: String,

    /// Extra stylesheets to load after the page's own, as URLs or paths
    #[arg(value_name = "SHEET")]
    pub sheets: Vec<String>,

    /// Selector of the fixture element
    #[arg(short, long, env = "CSSPEC_FIXTURE_SELECTOR")]
    pub fixture: Option<String>,

    /// Output format
    #[arg(short, long, env = "CSSPEC_REPORT")]
    pub output: Option<OutputFormat>,

    /// Timeout for each stylesheet fetch, in milliseconds
    #[arg(long, value_name = "MS", env = "CSSPEC_LOAD_TIMEOUT_MS")]
    pub timeout: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// Environment defaults overridden by the given flags.
    pub fn config(&self) -> CsspecConfig {
        let defaults = CsspecConfig::from_env();
        let report = self.output.map_or(defaults.report, |output| match output {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        });
        CsspecConfig::new(
            self.fixture.as_deref().unwrap_or(&defaults.fixture_selector),
            self.timeout.unwrap_or(defaults.load_timeout_ms),
            report,
        )
    }
}

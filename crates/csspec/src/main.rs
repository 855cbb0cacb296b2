use anyhow::Error;
use clap::Parser as _;
use csspec::fetch::resolve_reference;
use csspec::{ReportFormat, Runner};
use log::error;
use std::io::{self, Write as _};
use std::process::ExitCode;
use tokio::runtime::Runtime;

mod cli;

fn run() -> Result<bool, Error> {
    let cli = cli::Cli::parse();
    let config = cli.config();
    let sheets = cli
        .sheets
        .iter()
        .map(|sheet| resolve_reference(sheet, None).map(String::from))
        .collect::<Result<Vec<_>, _>>()?;

    let runtime = Runtime::new()?;
    let runner = Runner::new(config);
    let Some(report) = runtime.block_on(runner.run_page(&cli.page, &sheets))? else {
        return Ok(false);
    };

    let mut out = io::stdout().lock();
    match runner.config().report {
        ReportFormat::Text => write!(out, "{report}")?,
        ReportFormat::Json => writeln!(out, "{}", report.to_json()?)?,
    }
    Ok(report.passed())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}

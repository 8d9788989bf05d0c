// extraterm-launcher: hands command line requests to a running Extraterm,
// starting it first when needed.

pub mod client;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod exit_code;
pub mod launcher;
pub mod output;
pub mod settings;

use anyhow::{Context, Result};

use extraterm_launcher_common::args;

use crate::config::LauncherConfig;
use crate::dispatch::{dispatch, Invocation};
use crate::exit_code::ExitCode;
use crate::launcher::{ensure_running, launcher_dir, LaunchPlan};

/// Run one launcher invocation. `argv[0]` is the program name.
pub async fn run(argv: &[String]) -> Result<ExitCode> {
    let parsed = args::parse(argv)?;
    let invocation = Invocation::plan(parsed, std::env::current_dir)?;

    let platform = settings::current();
    let config = LauncherConfig::load(&platform).with_env_overrides();
    let plan = LaunchPlan::resolve(&platform, &config, &launcher_dir()?)?;

    let app = ensure_running(&plan).await.context("could not reach the main application")?;
    let report = dispatch(&app.client, &invocation).await?;

    if let Some(text) = report.render() {
        output::print_result(&text).context("failed to write command output")?;
    }
    Ok(report.exit_code())
}

//! `nep` - Nebula Pack command line

mod cli;
mod commands;
mod logging;
mod output;

use anyhow::Result;
use clap::ArgMatches;
use nep_config::layout::MARKER_FILE;
use nep_config::ConfigError;
use nep_core::LifecycleError;

use crate::cli::GlobalOptions;

#[tokio::main]
async fn main() {
    let matches = cli::build().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        return;
    };

    let global = GlobalOptions::from_matches(args);
    logging::init(global.verbose);

    if let Err(e) = dispatch(name, &global, args).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("error: {e:#}");
        if is_broken_project(&e) {
            eprintln!("hint: check {MARKER_FILE} in the project root, or pick a project with --path");
        }
        std::process::exit(1);
    }
}

async fn dispatch(name: &str, global: &GlobalOptions, args: &ArgMatches) -> Result<()> {
    match name {
        "init" => commands::init::run(global, args).await,
        "install" => commands::install::run(global, args).await,
        "update" => commands::update::run(global, args).await,
        "uninstall" => commands::uninstall::run(global, args).await,
        "list" => commands::list::run(global, args).await,
        other => anyhow::bail!("unknown command: {other}"),
    }
}

/// Check if the command failed because the project itself is unusable
fn is_broken_project(e: &anyhow::Error) -> bool {
    if let Some(e) = e.downcast_ref::<LifecycleError>() {
        return e.is_fatal_context();
    }
    e.downcast_ref::<ConfigError>()
        .is_some_and(ConfigError::is_context_error)
}

//! `nep install`

use anyhow::{Context, Result};
use clap::ArgMatches;
use nep_config::{init_project, ConfigError, InitOptions, ProjectRoot};
use nep_core::DependencySpec;

use super::{context, locate, manager, start_dir};
use crate::cli::{targets, BatchOptions, GlobalOptions};
use crate::output::render_batch;

pub(crate) async fn run(global: &GlobalOptions, args: &ArgMatches) -> Result<()> {
    let specs = targets(args)
        .iter()
        .map(|t| t.parse::<DependencySpec>())
        .collect::<Result<Vec<_>, _>>()?;
    let batch = BatchOptions::from_matches(args);

    let root = locate_or_init(global).await?;
    let report = manager(global, batch)?
        .install(&context(root, batch), specs)
        .await?;

    print!("{}", render_batch("installed", &report));
    Ok(())
}

/// Outside any project, turn the start directory into one
async fn locate_or_init(global: &GlobalOptions) -> Result<ProjectRoot> {
    match locate(global) {
        Ok(root) => Ok(root),
        Err(e) if is_not_a_project(&e) => {
            let start = start_dir(global)?;
            let root = init_project(&start, &InitOptions::default().in_place(true))
                .await
                .with_context(|| format!("cannot initialise project in {}", start.display()))?;
            println!("Not a nep project; initialised one in {}", root.dir().display());
            Ok(root)
        }
        Err(e) => Err(e),
    }
}

fn is_not_a_project(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<ConfigError>(),
        Some(ConfigError::NotAProject { .. })
    )
}

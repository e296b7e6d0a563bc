//! `nep uninstall`

use anyhow::Result;
use clap::ArgMatches;
use nep_core::{OperationContext, Selection};

use super::{locate, manager};
use crate::cli::{targets, BatchOptions, GlobalOptions};
use crate::output::render_uninstall;

pub(crate) async fn run(global: &GlobalOptions, args: &ArgMatches) -> Result<()> {
    let selection = Selection::parse(targets(args))?;
    let batch = BatchOptions {
        parallel: false,
        jobs: 1,
    };

    let root = locate(global)?;
    let report = manager(global, batch)?
        .uninstall(&OperationContext::new(root), selection)
        .await?;

    print!("{}", render_uninstall(&report));
    Ok(())
}

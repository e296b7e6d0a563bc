//! `nep update`

use anyhow::Result;
use clap::ArgMatches;
use nep_core::Selection;

use super::{context, locate, manager};
use crate::cli::{targets, BatchOptions, GlobalOptions};
use crate::output::render_update;

pub(crate) async fn run(global: &GlobalOptions, args: &ArgMatches) -> Result<()> {
    let selection = Selection::parse(targets(args))?;
    let batch = BatchOptions::from_matches(args);

    let root = locate(global)?;
    let report = manager(global, batch)?
        .update(&context(root, batch), selection)
        .await?;

    print!("{}", render_update(&report));
    Ok(())
}

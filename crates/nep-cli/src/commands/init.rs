//! `nep init`

use anyhow::Result;
use clap::ArgMatches;
use nep_config::{init_project, InitOptions};

use super::start_dir;
use crate::cli::GlobalOptions;

pub(crate) async fn run(global: &GlobalOptions, args: &ArgMatches) -> Result<()> {
    let name = args
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_default();
    let mut options = InitOptions::new(name).in_place(args.get_flag("current"));
    if let Some(author) = args.get_one::<String>("author") {
        options = options.with_author(author);
    }
    if let Some(description) = args.get_one::<String>("description") {
        options = options.with_description(description);
    }
    if let Some(license) = args.get_one::<String>("license") {
        options = options.with_license(license);
    }

    let root = init_project(&start_dir(global)?, &options).await?;
    println!(
        "Initialised project '{}' in {}",
        options.name.trim(),
        root.dir().display()
    );
    Ok(())
}

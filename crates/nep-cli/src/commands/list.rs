//! `nep list`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use nep_config::{ConfigMap, ConfigValue, ProjectRoot};

use super::locate;
use crate::cli::GlobalOptions;
use crate::output::render_dependencies;

pub(crate) async fn run(global: &GlobalOptions, args: &ArgMatches) -> Result<()> {
    let root = locate(global)?;
    let entries = recorded(&root).await?;

    match args.get_one::<PathBuf>("file") {
        Some(file) => {
            export(&entries, file).await?;
            println!("Wrote {} dependencies to {}", entries.len(), file.display());
        }
        None => print!("{}", render_dependencies(&entries)),
    }
    Ok(())
}

/// The `dependencies` region, empty when absent
async fn recorded(root: &ProjectRoot) -> Result<ConfigMap> {
    let document = root.store().load().await?;
    Ok(document.dependency_entries().cloned().unwrap_or_default())
}

/// Write the dependency map as pretty JSON
async fn export(entries: &ConfigMap, file: &Path) -> Result<()> {
    let mut text = serde_json::to_string_pretty(&ConfigValue::Object(entries.clone()))?;
    text.push('\n');
    tokio::fs::write(file, text)
        .await
        .with_context(|| format!("cannot write {}", file.display()))
}

//! Command line definition

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use nep_config::layout::DEFAULT_PROJECT_NAME;
use nep_remote::{DEFAULT_REGISTRY_URL, REGISTRY_URL_ENV};

/// Options shared by every subcommand
///
/// Read from the subcommand's matches, where global arguments are always
/// available whichever side of the subcommand name they were given on.
#[derive(Debug, Clone)]
pub(crate) struct GlobalOptions {
    /// Directory to start project discovery from
    pub(crate) path: Option<PathBuf>,
    pub(crate) verbose: bool,
    pub(crate) registry: String,
}

impl GlobalOptions {
    pub(crate) fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            path: matches.get_one::<PathBuf>("path").cloned(),
            verbose: matches.get_flag("verbose"),
            registry: matches
                .get_one::<String>("registry")
                .cloned()
                .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string()),
        }
    }
}

/// Batch options for install and update
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchOptions {
    pub(crate) parallel: bool,
    pub(crate) jobs: usize,
}

impl BatchOptions {
    pub(crate) fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            parallel: matches.get_flag("asynchronous"),
            jobs: matches.get_one::<usize>("jobs").copied().unwrap_or(8),
        }
    }
}

/// Positional targets of a subcommand
pub(crate) fn targets(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("packages")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn batch_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("asynchronous")
            .short('a')
            .long("asynchronous")
            .action(ArgAction::SetTrue)
            .help("Process packages in parallel"),
    )
    .arg(
        Arg::new("jobs")
            .short('j')
            .long("jobs")
            .default_value("8")
            .value_parser(RangedU64ValueParser::<usize>::new().range(1..))
            .help("Maximum packages processed at once with --asynchronous"),
    )
}

fn packages_arg(help: &'static str) -> Arg {
    Arg::new("packages")
        .num_args(0..)
        .value_name("PACKAGE")
        .help(help)
}

/// Build the `nep` command
pub(crate) fn build() -> Command {
    Command::new("nep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Nebula Pack - per-project package manager")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Run as if started in this directory"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .global(true)
                .env(REGISTRY_URL_ENV)
                .value_name("URL")
                .help("Package registry base URL"),
        )
        .subcommand(
            Command::new("init")
                .about("Create a new project")
                .arg(
                    Arg::new("name")
                        .default_value(DEFAULT_PROJECT_NAME)
                        .help("Project name"),
                )
                .arg(
                    Arg::new("current")
                        .short('c')
                        .long("current")
                        .action(ArgAction::SetTrue)
                        .help("Initialise the current directory instead of a new one"),
                )
                .arg(Arg::new("author").long("author").help("Project author"))
                .arg(
                    Arg::new("description")
                        .long("description")
                        .help("Project description"),
                )
                .arg(Arg::new("license").long("license").help("Project license")),
        )
        .subcommand(batch_args(
            Command::new("install")
                .visible_alias("i")
                .about("Install packages (all recorded dependencies when none given)")
                .arg(packages_arg("Packages as name or name::version")),
        ))
        .subcommand(batch_args(
            Command::new("update")
                .visible_alias("up")
                .about("Update packages through the staging area")
                .arg(packages_arg("Packages as name or name::version, or * for all")),
        ))
        .subcommand(
            Command::new("uninstall")
                .visible_alias("rm")
                .about("Remove packages")
                .arg(packages_arg("Package names, or * for all")),
        )
        .subcommand(
            Command::new("list")
                .visible_alias("ls")
                .about("List recorded dependencies")
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the dependency map as JSON to this file"),
                ),
        )
}

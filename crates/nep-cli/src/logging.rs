//! Subscriber setup

use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,nep=debug,nep_cli=debug,nep_core=debug,nep_config=debug,nep_remote=debug"
    } else {
        "warn,nep=info,nep_cli=info,nep_core=info,nep_config=info,nep_remote=info"
    }
}

/// Install the global fmt subscriber; `RUST_LOG` wins over `--verbose`
pub(crate) fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

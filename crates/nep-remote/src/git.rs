//! Git checkout through the `git` command line tool

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use nep_core::{Checkout, CheckoutError, PackageRecord};
use tokio::process::Command;

/// [`Checkout`] running `git clone -- <source> <target>`
#[derive(Debug, Clone)]
pub struct GitCheckout {
    program: String,
    verbose: bool,
}

impl GitCheckout {
    /// Use `git` from `PATH`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific git executable
    #[inline]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Show git's progress output on the terminal
    #[inline]
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn command(&self, record: &PackageRecord, target: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("clone");
        if self.verbose {
            cmd.arg("--progress")
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        } else {
            cmd.arg("--quiet")
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
        }
        // End of options: the source comes from registry metadata.
        cmd.arg("--")
            .arg(&record.source)
            .arg(target)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            verbose: false,
        }
    }
}

#[async_trait]
impl Checkout for GitCheckout {
    async fn checkout(&self, record: &PackageRecord, target: &Path) -> Result<(), CheckoutError> {
        tracing::debug!(source = %record.source, target = %target.display(), "cloning");

        let output = self
            .command(record, target)
            .output()
            .await
            .map_err(|source| CheckoutError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        Err(CheckoutError::Failed {
            source_url: record.source.clone(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

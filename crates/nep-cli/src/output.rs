//! Plain-text rendering of command results

use std::fmt::Write as _;

use nep_config::ConfigMap;
use nep_core::{BatchReport, UninstallReport, UpdateReport};

/// Two-column table, first column padded to its widest entry
fn table(rows: &[(String, String)]) -> String {
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (left, right) in rows {
        let _ = writeln!(out, "  {left:<width$}  {right}");
    }
    out
}

/// Per-package lines of an install batch
pub(crate) fn render_batch(verb: &str, report: &BatchReport) -> String {
    if report.is_empty() {
        return "Nothing to do\n".to_string();
    }

    let mut rows = Vec::new();
    for outcome in &report.outcomes {
        let status = match &outcome.result {
            Ok(pkg) => format!("{verb} {} as {}", pkg.version, pkg.key),
            Err(e) => format!("FAILED: {e}"),
        };
        rows.push((outcome.spec.to_string(), status));
        for warning in &outcome.warnings {
            rows.push((String::new(), format!("warning: {warning}")));
        }
    }

    let mut out = table(&rows);
    let _ = writeln!(
        out,
        "{} succeeded, {} failed",
        report.success_count(),
        report.failure_count()
    );
    out
}

/// Staging and promotion results of an update
pub(crate) fn render_update(report: &UpdateReport) -> String {
    if report.staged.is_empty() {
        return "Nothing to do\n".to_string();
    }

    let mut out = render_batch("staged", &report.staged);
    let rows: Vec<_> = report
        .promotions
        .iter()
        .map(|p| {
            let status = match &p.result {
                Ok(_) => "updated".to_string(),
                Err(e) if e.is_skip() => format!("skipped: {e}"),
                Err(e) => format!("FAILED: {e}"),
            };
            (p.package.clone(), status)
        })
        .collect();
    out.push_str(&table(&rows));
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

/// Removed packages and directory warnings
pub(crate) fn render_uninstall(report: &UninstallReport) -> String {
    let mut out = String::new();
    if report.removed.is_empty() {
        out.push_str("No dependencies to remove\n");
    }
    for name in &report.removed {
        let _ = writeln!(out, "  removed {name}");
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

/// Sorted `name  version` table of recorded dependencies
pub(crate) fn render_dependencies(entries: &ConfigMap) -> String {
    if entries.is_empty() {
        return "No dependencies\n".to_string();
    }
    let rows: Vec<_> = entries
        .iter()
        .map(|(name, version)| {
            let version = version
                .as_str()
                .map_or_else(|| serde_json::Value::from(version.clone()).to_string(), str::to_string);
            (name.clone(), version)
        })
        .collect();
    table(&rows)
}

//! Severity summaries for fetched issues.
//!
//! Functions in this module count issues per severity and render a short
//! human-readable report to any writer or directly to stdout.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};

use crate::models::Issue;

/// Count issues per severity label.
///
/// Missing or unrecognised severities are counted as `UNKNOWN`. The result
/// is ordered by descending count, ties broken alphabetically.
///
/// # Examples
///
/// ```
/// use sqi::models::Issue;
/// use sqi::summary::summarize_severities;
///
/// let issue = |s: &str| Issue { severity: Some(s.into()), ..Issue::default() };
/// let summary = summarize_severities(&[issue("MAJOR"), issue("MINOR"), issue("MAJOR")]);
/// assert_eq!(summary, vec![("MAJOR".into(), 2), ("MINOR".into(), 1)]);
/// ```
#[must_use]
pub fn summarize_severities(issues: &[Issue]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for issue in issues {
        *counts.entry(issue.severity_label()).or_default() += 1;
    }
    let mut v: Vec<_> = counts
        .into_iter()
        .map(|(label, count)| (label.to_owned(), count))
        .collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}

/// Write the provenance line and severity counts to any writer.
///
/// # Errors
///
/// Returns an error if writing to the provided output fails.
pub fn write_summary<W: Write>(
    mut out: W,
    source: &str,
    summary: &[(String, usize)],
) -> std::io::Result<()> {
    let total: usize = summary.iter().map(|(_, n)| n).sum();
    let label = if total == 1 { "issue" } else { "issues" };
    writeln!(out, "{total} {label} from {source}")?;
    for (severity, count) in summary {
        writeln!(out, "  {severity}: {count}")?;
    }
    Ok(())
}

/// Print the summary directly to stdout.
pub fn print_summary(source: &str, summary: &[(String, usize)]) {
    if let Err(e) = write_summary(std::io::stdout().lock(), source, summary) {
        if e.kind() == ErrorKind::BrokenPipe {
            return;
        }
        tracing::error!("failed to write summary: {e}");
    }
}

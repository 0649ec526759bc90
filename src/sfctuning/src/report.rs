use std::path::Path;

use anyhow::{Context, Result};

use sfcsim::orchestrator::RunSummary;

/// The four-line plain-text summary of a run.
pub fn format_report(summary: &RunSummary, avg_processing_secs: f64) -> String {
    format!(
        "Acceptance ratio: {}%\n\
         SLA violation ratio: {}%\n\
         Total allocated resources: {}\n\
         Average processing time: {:.6} seconds\n",
        summary.acceptance_ratio,
        summary.violation_ratio,
        summary.total_resources,
        avg_processing_secs
    )
}

pub fn write_report<P: AsRef<Path>>(
    path: P,
    summary: &RunSummary,
    avg_processing_secs: f64,
) -> Result<()> {
    std::fs::write(path.as_ref(), format_report(summary, avg_processing_secs))
        .with_context(|| format!("fail to write report to {:?}", path.as_ref()))
}

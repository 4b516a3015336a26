use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use nfusion_common::model::{DatasetMetadata, FindingSet, SeveritySummary};
use nfusion_core::fusion::FusionStats;
use nfusion_core::pipeline::Analysis;
use nfusion_core::views::Views;

/// Everything one run produced, in export form.
#[derive(Serialize)]
pub struct Report<'a> {
    pub metadata: &'a DatasetMetadata,
    pub stats: &'a FusionStats,
    pub skipped: Vec<String>,
    /// Absent when the policy was rejected.
    pub findings: Option<&'a FindingSet>,
    pub severity_summary: Option<SeveritySummary>,
    pub policy_error: Option<String>,
    pub views: Views,
}

impl<'a> Report<'a> {
    pub fn new(analysis: &'a Analysis) -> Self {
        let findings = analysis.findings.as_ref().ok();
        Self {
            metadata: analysis.dataset.metadata(),
            stats: &analysis.stats,
            skipped: analysis.skipped.iter().map(ToString::to_string).collect(),
            findings,
            severity_summary: findings.map(FindingSet::summary),
            policy_error: analysis.findings.as_ref().err().map(ToString::to_string),
            views: analysis.views(),
        }
    }
}

pub fn write_json(report: &Report<'_>, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}

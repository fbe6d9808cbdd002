use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stampede_core::{LoadTestReport, ScenarioBaseline};

/// Snapshot of the effective run configuration, embedded in the report file
/// so artifacts are diffable across runs.
#[derive(Debug, Serialize)]
pub(crate) struct ConfigEcho {
    pub base_url: String,
    pub concurrent_users: u64,
    pub duration_seconds: f64,
    pub ramp_up_seconds: f64,
    pub think_min_ms: u64,
    pub think_max_ms: u64,
    pub seed: Option<u64>,
    pub scenario_count: usize,
}

/// The durable JSON artifact for one run.
#[derive(Debug, Serialize)]
pub(crate) struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub config: ConfigEcho,
    pub baseline: Vec<ScenarioBaseline>,
    pub report: LoadTestReport,
}

pub(crate) async fn write(dir: &Path, doc: &ReportDocument) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create results directory: {}", dir.display()))?;

    let filename = format!(
        "load-test-results-{}.json",
        doc.generated_at.format("%Y-%m-%dT%H-%M-%S")
    );
    let path = dir.join(filename);

    let bytes = serde_json::to_vec_pretty(doc).context("failed to serialize report")?;
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write report: {}", path.display()))?;

    Ok(path)
}

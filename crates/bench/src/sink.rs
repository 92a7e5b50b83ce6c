//! Results sink: one JSON file and one Markdown report per summary.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::BenchError;

/// A record that can be persisted by the sink.
pub trait Report: Serialize {
    fn to_markdown(&self) -> String;
}

/// Where a report landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
}

/// File-system safe form of a run name (path separators become `_`).
pub fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Write `<dir>/<name>-summary.json` and `<dir>/<name>-summary.md`,
/// creating `dir` if needed.  Existing files are overwritten.
pub async fn write_report<R: Report>(
    dir: &Path,
    name: &str,
    report: &R,
) -> Result<ArtifactPaths, BenchError> {
    tokio::fs::create_dir_all(dir).await?;

    let stem = sanitize_name(name);
    let paths = ArtifactPaths {
        json: dir.join(format!("{stem}-summary.json")),
        markdown: dir.join(format!("{stem}-summary.md")),
    };

    tokio::fs::write(&paths.json, serde_json::to_string_pretty(report)?).await?;
    tokio::fs::write(&paths.markdown, report.to_markdown()).await?;

    debug!(json = %paths.json.display(), markdown = %paths.markdown.display(), "wrote report");
    Ok(paths)
}

//! `srag ingest` and `srag rebuild`.

use std::path::Path;

use anyhow::{Context, Result};

use syllabus_rag_core::models::BuildReport;

use crate::config::Config;
use crate::{db, services};

/// Store a plain-text file as a new document and index it.
///
/// The title defaults to the file stem.
pub async fn run_ingest(config: &Config, path: &Path, title: Option<String>) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let title = title.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    });

    let pool = db::connect(config).await?;
    let builder = services::knowledge_base(config, &pool)?;
    let report = builder.ingest(&title, &content).await?;

    print_report("Ingest", &report);
    Ok(())
}

/// Re-index the most recently uploaded document.
pub async fn run_rebuild(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let builder = services::knowledge_base(config, &pool)?;
    let report = builder.rebuild().await?;

    print_report("Rebuild", &report);
    Ok(())
}

fn print_report(label: &str, report: &BuildReport) {
    println!("{} {}", label, report.document_id);
    println!("  chunks:     {}", report.chunks);
    println!("  embeddings: {}", report.embeddings);
    println!("  records:    {}", report.records);
    println!("ok");
}

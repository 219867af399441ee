//! Convert command implementation

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use threatspec::config::Config;
use threatspec::model::ThreatModelDocument;
use threatspec::report::ReportDocument;

/// Convert one project of the (merged) documents to the indexed format
pub fn convert_command(
    config: &Config,
    files: &[PathBuf],
    project: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let report = ReportDocument::load_all(files)?;

    let project = match project {
        Some(project) => project,
        None if report.projects.len() == 1 => report.projects.keys().next().cloned().unwrap_or_default(),
        None if report.projects.contains_key(&config.settings.project) => config.settings.project.clone(),
        None => {
            let names: Vec<&str> = report.projects.keys().map(String::as_str).collect();
            bail!("Choose a project with --project (available: {})", names.join(", "));
        }
    };

    let model = ThreatModelDocument::from_report(&report, &project)?;
    let json = model.to_json_pretty()?;

    match out {
        Some(path) => write_model(&path, &json)?,
        None => println!("{}", json),
    }
    Ok(())
}

fn write_model(path: &Path, json: &str) -> Result<()> {
    info!("Writing output to {}", path.display());
    std::fs::write(path, format!("{}\n", json))
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

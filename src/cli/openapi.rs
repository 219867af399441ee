//! OpenAPI command implementation

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use threatspec::config::Config;
use threatspec::openapi::OpenApiExtractor;
use threatspec::registry::ThreatRegistry;

use super::{apply_tags, project_name, write_document};

/// Extract tags from OpenAPI documents and write the document
pub fn openapi_command(
    work_dir: &Path,
    config: &Config,
    files: Vec<PathBuf>,
    project: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let project = project_name(config, project)?;
    let extractor = OpenApiExtractor::new();

    let mut tags = Vec::new();
    for file in &files {
        info!("Parsing file {}", file.display());
        tags.extend(extractor.load_file(file)?);
    }

    let mut registry = ThreatRegistry::new();
    apply_tags(&mut registry, &tags, config.settings.strict)?;
    write_document(work_dir, config, &registry, &project, out)?;
    Ok(())
}

//! Parse command implementation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use threatspec::config::Config;
use threatspec::registry::ThreatRegistry;
use threatspec::report::ReportDocument;
use threatspec::scanner::Scanner;

use super::{apply_tags, project_name, write_document};

/// Scan files and directories for tags and write the document
pub async fn parse_command(
    work_dir: &Path,
    config: &Config,
    paths: Vec<PathBuf>,
    project: Option<String>,
    out: Option<PathBuf>,
    libraries: Vec<PathBuf>,
) -> Result<()> {
    let project = project_name(config, project)?;
    let paths = if paths.is_empty() {
        vec![work_dir.to_path_buf()]
    } else {
        paths
    };

    let mut registry = ThreatRegistry::new();

    // Libraries from the config are relative to the repository
    let config_libraries = config.settings.libraries.iter().map(|l| work_dir.join(l));
    for library in config_libraries.chain(libraries) {
        info!("Loading threat library {}", library.display());
        let doc = ReportDocument::load(&library)
            .with_context(|| format!("Failed to load threat library: {}", library.display()))?;
        registry.import_catalog(&doc);
    }

    let mut tags = Vec::new();
    for path in &paths {
        info!("Parsing {}", path.display());
        let scanner = Scanner::with_config(
            path,
            &config.settings.scan_exclude,
            &config.settings.comment_markers,
        );
        tags.extend(scanner.scan().await?);
    }
    info!("Found {} tags", tags.len());

    apply_tags(&mut registry, &tags, config.settings.strict)?;
    write_document(work_dir, config, &registry, &project, out)?;

    println!(
        "Project '{}': {} boundaries, {} threats, {} elements",
        project,
        registry.boundaries.len(),
        registry.threats.len(),
        registry.element_count()
    );
    Ok(())
}

//! CLI command implementations

pub mod check;
pub mod convert;
pub mod import_cwe;
pub mod init;
pub mod openapi;
pub mod parse;
pub mod report;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{info, warn};

use threatspec::comment::TagComment;
use threatspec::config::Config;
use threatspec::registry::ThreatRegistry;
use threatspec::report::Reporter;

/// Apply tags to a registry
///
/// In strict mode the first tag that cannot be applied aborts the command,
/// otherwise failures are logged and skipped.
pub(crate) fn apply_tags(registry: &mut ThreatRegistry, tags: &[TagComment], strict: bool) -> Result<()> {
    if strict {
        let mut ordered: Vec<&TagComment> = tags.iter().collect();
        ordered.sort_by_key(|t| t.kind.apply_order());
        for tag in ordered {
            registry.apply(tag)?;
        }
        return Ok(());
    }

    let errors = registry.apply_all(tags);
    if !errors.is_empty() {
        warn!("{} of {} tags could not be applied", errors.len(), tags.len());
    }
    Ok(())
}

/// Export the registry and write it to the output file
pub(crate) fn write_document(
    work_dir: &Path,
    config: &Config,
    registry: &ThreatRegistry,
    project: &str,
    out: Option<PathBuf>,
) -> Result<PathBuf> {
    let outfile = out.unwrap_or_else(|| work_dir.join(config.output_path(project)));
    if registry.element_count() == 0 && registry.dfd.is_empty() {
        warn!("No threat model elements found for project '{}'", project);
    }

    let doc = Reporter::new(registry, project).export();
    info!("Writing output to {}", outfile.display());
    doc.save(&outfile)?;
    Ok(outfile)
}

/// Project name from the command line or config
pub(crate) fn project_name(config: &Config, project: Option<String>) -> Result<String> {
    let project = project.unwrap_or_else(|| config.settings.project.clone());
    if project.trim().is_empty() {
        bail!("Project name must not be empty");
    }
    Ok(project)
}

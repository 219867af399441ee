//! Import-cwe command implementation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use threatspec::catalog::{library, CweCatalog};

/// Default library file name
pub fn default_output(sfp: bool) -> &'static str {
    if sfp {
        "sfp_library.threatspec.json"
    } else {
        "cwe_library.threatspec.json"
    }
}

/// Build a threat library from a CWE XML catalogue
pub fn import_cwe_command(work_dir: &Path, file: &Path, sfp: bool, out: Option<PathBuf>) -> Result<()> {
    info!("Parsing CWE file {}", file.display());
    let catalog = CweCatalog::load(file)
        .with_context(|| format!("Failed to import CWE catalogue: {}", file.display()))?;

    let threats = if sfp {
        catalog.sfp_threats()?
    } else {
        catalog.threats()
    };
    let count = threats.len();

    let path = out.unwrap_or_else(|| work_dir.join(default_output(sfp)));
    library(threats).save(&path)?;
    info!("Wrote {} threats to {}", count, path.display());
    Ok(())
}

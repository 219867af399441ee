//! Check command implementation

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use threatspec::model::ThreatModelDocument;

/// Check that every index and threat key in the models resolves
pub fn check_command(files: &[PathBuf]) -> Result<()> {
    let mut issue_count = 0;

    for file in files {
        let doc = ThreatModelDocument::load(file)
            .with_context(|| format!("Failed to load threat model: {}", file.display()))?;

        let issues = doc.check();
        for issue in &issues {
            warn!("{}: {}", file.display(), issue);
        }
        if issues.is_empty() {
            info!("{}: {} projects OK", file.display(), doc.models.len());
        }
        issue_count += issues.len();
    }

    if issue_count > 0 {
        bail!("{} dangling references found", issue_count);
    }
    Ok(())
}

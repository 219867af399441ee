//! Validate command implementation

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use threatspec::config::Config;
use threatspec::report::ReportDocument;
use threatspec::validate::{check_references, SchemaValidator};

/// Validate documents against the schema and check their references
pub fn validate_command(
    config: &Config,
    files: &[PathBuf],
    schema: Option<PathBuf>,
    relax: u8,
) -> Result<()> {
    // The command line wins over the config
    let relax = if relax > 0 { relax } else { config.validate.relax };
    if relax >= 1 {
        info!("Using relaxed validation. Ignoring additionalProperties errors");
    }
    if relax >= 2 {
        info!("Using very relaxed validation. Ignoring required errors");
    }

    let schema = schema.or_else(|| config.validate.schema.as_ref().map(PathBuf::from));
    let validator = match &schema {
        Some(path) => SchemaValidator::from_file(path)
            .with_context(|| format!("Failed to load schema: {}", path.display()))?,
        None => SchemaValidator::new()?,
    };

    let mut problem_count = 0;
    for file in files {
        info!("Validating file {}", file.display());
        problem_count += validate_file(&validator, file, relax)?;
    }

    if problem_count > 0 {
        bail!("{} problems found", problem_count);
    }
    info!("All files validated successfully");
    Ok(())
}

fn validate_file(validator: &SchemaValidator, file: &Path, relax: u8) -> Result<usize> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", file.display()))?;

    let outcome = validator.validate(&value, relax);
    for message in &outcome.ignored {
        info!("Ignoring error: {}", message);
    }
    for message in &outcome.problems {
        warn!("{}: {}", file.display(), message);
    }
    let mut count = outcome.problems.len();

    // References can only be followed in documents that deserialize
    match serde_json::from_value::<ReportDocument>(value) {
        Ok(doc) => {
            let issues = check_references(&doc);
            for issue in &issues {
                warn!("{}: {}", file.display(), issue);
            }
            count += issues.len();
        }
        Err(e) if outcome.problems.is_empty() => {
            warn!("{}: {}", file.display(), e);
            count += 1;
        }
        Err(_) => {}
    }

    Ok(count)
}

//! Init command implementation

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default configuration content for threatspec init
pub const DEFAULT_CONFIG: &str = r#"# threatspec configuration
# =======================
#
# Threat model tags live in source comments:
#
#   // @alias component @web:@app to Web Application
#   // @mitigates @web:@app against XSS with output encoding (#42)
#   // @connects User:Browser to @web:@app as HTTPS

# ============================================================================
# SETTINGS
# ============================================================================
#
# Available options:
#   project          - Project name recorded in generated documents (default: "default")
#   output           - Output file (default: PROJECT.threatspec.json)
#   scan_exclude     - Extra glob patterns skipped when scanning
#   comment_markers  - Comment markers stripped before tags (default: // /* * # -- """ ''')
#   strict           - Abort on the first tag that cannot be applied (default: false)
#   libraries        - Threat library documents preloaded before parsing

[settings]
project = "default"
scan_exclude = ["target/**", "node_modules/**", "vendor/**"]
comment_markers = []
strict = false
libraries = []

# ============================================================================
# VALIDATE
# ============================================================================
#
#   relax   - 0 = strict, 1 = ignore additionalProperties, 2 = also ignore required
#   schema  - JSON schema replacing the built-in one

[validate]
relax = 0
"#;

/// Write the default configuration
///
/// Defaults to `.threatspec/config.toml` in the repository.
pub async fn init_command(work_dir: &Path, config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| work_dir.join(".threatspec").join("config.toml"));

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    // Create parent directory (if any)
    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(&config_path, DEFAULT_CONFIG).await?;
    info!("Wrote default configuration");
    println!("Created: {}", config_path.display());

    Ok(())
}

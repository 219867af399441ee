//! Settings configuration types

use serde::{Deserialize, Serialize};

/// General settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Project name recorded in generated documents
    #[serde(default = "default_project")]
    pub project: String,

    /// Output file for parse/openapi (default: `<project>.threatspec.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Extra glob patterns excluded from scanning (relative to the scan root)
    #[serde(default)]
    pub scan_exclude: Vec<String>,

    /// Comment markers stripped before looking for tags (empty = built-in list)
    #[serde(default)]
    pub comment_markers: Vec<String>,

    /// Abort on the first tag that cannot be applied
    #[serde(default)]
    pub strict: bool,

    /// Threat libraries (IR documents) preloaded before parsing
    #[serde(default)]
    pub libraries: Vec<String>,
}

fn default_project() -> String {
    "default".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project: default_project(),
            output: None,
            scan_exclude: Vec::new(),
            comment_markers: Vec::new(),
            strict: false,
            libraries: Vec::new(),
        }
    }
}

/// Schema validation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateSettings {
    /// 0 = strict, 1 = ignore additionalProperties, 2 = also ignore required
    #[serde(default)]
    pub relax: u8,

    /// Schema file replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

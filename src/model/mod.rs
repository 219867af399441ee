//! Indexed threat model document
//!
//! A compact, project-scoped form of the threat model where boundaries and
//! components are numbered per project and relations refer to them by index:
//!
//! ```json
//! {
//!   "boundaries": { "Project A": { "0": { "name": "WebApp" } } },
//!   "components": { "Project A": { "0": { "name": "FileSystem" } } },
//!   "models": {
//!     "Project A": {
//!       "exposes":   { "0": { "boundary": 0, "component": 0, "exposure": "...", "ref": [], "threat": "@cwe_xxx_yyy" } },
//!       "sends":     { "0": { "srcboundary": 0, "srccomponent": 0, "dstboundary": 0, "dstcomponent": 0, "message": "..." } },
//!       "mitigates": { "0": { "boundary": 0, "component": 0, "mitigation": "...", "ref": [], "threat": "@cwe_xxx_zzz" } }
//!     },
//!     "Project B": {}
//!   },
//!   "threats": { "@cwe_xxx_yyy": "XXX YYY" }
//! }
//! ```

mod convert;
mod integrity;

pub use integrity::{IntegrityIssue, ModelSection, Reference};

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Position of an entry within its project map
pub type Index = usize;

/// Error type for loading model documents
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid threat model document: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Project not found: {0}")]
    UnknownProject(String),
}

/// A boundary or component entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

impl NamedEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A weakness of a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureEntry {
    pub boundary: Index,
    pub component: Index,
    pub exposure: String,
    #[serde(rename = "ref", default)]
    pub refs: Vec<String>,
    pub threat: String,
}

/// A message sent from one component to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEntry {
    pub srcboundary: Index,
    pub srccomponent: Index,
    pub dstboundary: Index,
    pub dstcomponent: Index,
    #[serde(default)]
    pub message: String,
}

/// A control reducing a threat's impact on a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationEntry {
    pub boundary: Index,
    pub component: Index,
    pub mitigation: String,
    #[serde(rename = "ref", default)]
    pub refs: Vec<String>,
    pub threat: String,
}

/// The relations recorded for one project
///
/// Every section may be missing; an empty object is a valid project model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exposes: BTreeMap<Index, ExposureEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sends: BTreeMap<Index, FlowEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mitigates: BTreeMap<Index, MitigationEntry>,
}

impl ProjectModel {
    pub fn is_empty(&self) -> bool {
        self.exposes.is_empty() && self.sends.is_empty() && self.mitigates.is_empty()
    }
}

/// The whole indexed document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatModelDocument {
    /// project -> index -> boundary
    #[serde(default)]
    pub boundaries: BTreeMap<String, BTreeMap<Index, NamedEntry>>,
    /// project -> index -> component
    #[serde(default)]
    pub components: BTreeMap<String, BTreeMap<Index, NamedEntry>>,
    /// project -> relations
    #[serde(default)]
    pub models: BTreeMap<String, ProjectModel>,
    /// threat key -> label
    #[serde(default)]
    pub threats: BTreeMap<String, String>,
}

impl ThreatModelDocument {
    /// Parse a document from JSON text
    pub fn from_json(content: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a document from a JSON file
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Names of all projects mentioned in any section
    pub fn projects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .boundaries
            .keys()
            .chain(self.components.keys())
            .chain(self.models.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// The relations of a project
    pub fn model(&self, project: &str) -> Result<&ProjectModel, ModelError> {
        self.models
            .get(project)
            .ok_or_else(|| ModelError::UnknownProject(project.to_string()))
    }

    /// Label of a threat key
    pub fn threat_label(&self, key: &str) -> Option<&str> {
        self.threats.get(key).map(String::as_str)
    }

    pub fn boundary(&self, project: &str, index: Index) -> Option<&NamedEntry> {
        self.boundaries.get(project)?.get(&index)
    }

    pub fn component(&self, project: &str, index: Index) -> Option<&NamedEntry> {
        self.components.get(project)?.get(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_project_model() {
        let doc = ThreatModelDocument::from_json(r#"{"models": {"Project B": {}}}"#).unwrap();
        let model = doc.model("Project B").unwrap();
        assert!(model.is_empty());
        assert!(doc.boundaries.is_empty());
        assert!(doc.threats.is_empty());
    }

    #[test]
    fn test_unknown_project() {
        let doc = ThreatModelDocument::default();
        assert!(matches!(doc.model("nope"), Err(ModelError::UnknownProject(_))));
    }

    #[test]
    fn test_numeric_keys() {
        let doc = ThreatModelDocument::from_json(
            r#"{"components": {"p": {"2": {"name": "c2"}, "10": {"name": "c10"}}}}"#,
        )
        .unwrap();
        let indices: Vec<Index> = doc.components["p"].keys().copied().collect();
        assert_eq!(indices, vec![2, 10]);
        assert_eq!(doc.component("p", 10).unwrap().name, "c10");
    }

    #[test]
    fn test_ref_field_name() {
        let entry = MitigationEntry {
            boundary: 0,
            component: 1,
            mitigation: "m".to_string(),
            refs: vec!["#1".to_string()],
            threat: "@t".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["ref"], serde_json::json!(["#1"]));
        assert!(json.get("refs").is_none());
    }
}

//! Intermediate representation document
//!
//! The output of parsing is a JSON document that reporting or visualisation
//! tools consume. Documents can be merged, even when produced from different
//! languages or projects, to build the threat model of a larger system:
//!
//! ```json
//! {
//!   "specification": { "name": "ThreatSpec", "version": "0.1.0" },
//!   "document": { "created": 1500000000000, "updated": 1500000000000 },
//!   "boundaries": { "@web": { "name": "Web" } },
//!   "components": { "@web": { "@app": { "name": "App" } } },
//!   "threats": { "@xss": { "name": "XSS" } },
//!   "dfd": { ... },
//!   "projects": { "default": { "mitigations": {}, "exposures": {}, ... } }
//! }
//! ```

mod coverage;

pub use coverage::{CoverageStatus, ThreatCoverage, ThreatNode};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    Acceptance, Boundary, Component, Dfd, Element, Exposure, Mitigation, Review, Threat, Transfer,
};
use crate::registry::{ElementMap, ThreatRegistry};

pub const SPECIFICATION_NAME: &str = "ThreatSpec";
pub const SPECIFICATION_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub version: String,
}

impl Default for Specification {
    fn default() -> Self {
        Self {
            name: SPECIFICATION_NAME.to_string(),
            version: SPECIFICATION_VERSION.to_string(),
        }
    }
}

/// Document timestamps (ms since epoch)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub created: i64,
    pub updated: i64,
}

/// Project specific elements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    #[serde(default)]
    pub mitigations: ElementMap<Mitigation>,
    #[serde(default)]
    pub exposures: ElementMap<Exposure>,
    #[serde(default)]
    pub acceptances: ElementMap<Acceptance>,
    #[serde(default)]
    pub transfers: ElementMap<Transfer>,
    #[serde(default)]
    pub reviews: ElementMap<Review>,
}

fn append<T>(into: &mut ElementMap<T>, from: ElementMap<T>) {
    for (id, items) in from {
        into.entry(id).or_default().extend(items);
    }
}

fn flatten<T: Element>(map: &ElementMap<T>) -> impl Iterator<Item = &dyn Element> {
    map.values().flatten().map(|e| e as &dyn Element)
}

impl ProjectReport {
    /// Append all elements of another project report
    pub fn merge(&mut self, other: ProjectReport) {
        append(&mut self.mitigations, other.mitigations);
        append(&mut self.exposures, other.exposures);
        append(&mut self.acceptances, other.acceptances);
        append(&mut self.transfers, other.transfers);
        append(&mut self.reviews, other.reviews);
    }

    /// Iterate over every element regardless of kind
    pub fn elements(&self) -> impl Iterator<Item = &dyn Element> {
        flatten(&self.mitigations)
            .chain(flatten(&self.exposures))
            .chain(flatten(&self.acceptances))
            .chain(flatten(&self.transfers))
            .chain(flatten(&self.reviews))
    }

    pub fn is_empty(&self) -> bool {
        self.elements().next().is_none()
    }
}

/// The intermediate representation document
///
/// Every section defaults to empty, so threat libraries that only carry
/// `threats` load as documents too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(default)]
    pub specification: Specification,
    #[serde(default)]
    pub document: DocumentInfo,
    #[serde(default)]
    pub boundaries: BTreeMap<String, Boundary>,
    #[serde(default)]
    pub components: BTreeMap<String, BTreeMap<String, Component>>,
    #[serde(default)]
    pub threats: BTreeMap<String, Threat>,
    #[serde(default)]
    pub dfd: Dfd,
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectReport>,
}

impl ReportDocument {
    /// Load a document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let doc: ReportDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse threatspec document: {}", path.display()))?;
        Ok(doc)
    }

    /// Load and merge several documents
    pub fn load_all(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let mut merged: Option<ReportDocument> = None;
        for path in paths {
            let doc = Self::load(path.as_ref())?;
            match merged.as_mut() {
                Some(m) => m.merge(doc),
                None => merged = Some(doc),
            }
        }
        Ok(merged.unwrap_or_default())
    }

    /// Write the document as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize document")?;
        std::fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        Ok(())
    }

    /// Merge another document into this one
    ///
    /// Shared entries (boundaries, components, threats, DFD edges) already
    /// present are kept. Project elements are appended.
    pub fn merge(&mut self, other: ReportDocument) {
        for (id, boundary) in other.boundaries {
            self.boundaries.entry(id).or_insert(boundary);
        }
        for (boundary_id, components) in other.components {
            let entry = self.components.entry(boundary_id).or_default();
            for (id, component) in components {
                entry.entry(id).or_insert(component);
            }
        }
        for (id, threat) in other.threats {
            self.threats.entry(id).or_insert(threat);
        }
        self.dfd.merge(other.dfd);
        for (name, project) in other.projects {
            self.projects.entry(name).or_default().merge(project);
        }

        self.document.created = match (self.document.created, other.document.created) {
            (0, c) | (c, 0) => c,
            (a, b) => a.min(b),
        };
        self.document.updated = self.document.updated.max(other.document.updated);
    }

    /// Look up a component by boundary and component identifier
    pub fn component(&self, boundary_id: &str, component_id: &str) -> Option<&Component> {
        self.components.get(boundary_id)?.get(component_id)
    }
}

/// Builds the intermediate document from a registry
pub struct Reporter<'a> {
    registry: &'a ThreatRegistry,
    project: String,
}

impl<'a> Reporter<'a> {
    pub fn new(registry: &'a ThreatRegistry, project: impl Into<String>) -> Self {
        Self {
            registry,
            project: project.into(),
        }
    }

    /// Export the registry as a document with a single project
    pub fn export(&self) -> ReportDocument {
        let registry = self.registry;

        // Boundaries, components, threats and the DFD are shared across projects
        let mut doc = ReportDocument {
            specification: Specification::default(),
            document: DocumentInfo {
                created: registry.created,
                updated: registry.updated,
            },
            boundaries: registry.boundaries.clone(),
            components: registry.components.clone(),
            threats: registry.threats.clone(),
            dfd: registry.dfd.clone(),
            projects: BTreeMap::new(),
        };

        let project = ProjectReport {
            mitigations: registry.mitigations.clone(),
            exposures: registry.exposures.clone(),
            acceptances: registry.acceptances.clone(),
            transfers: registry.transfers.clone(),
            reviews: registry.reviews.clone(),
        };
        debug!(
            "Exporting project '{}' with {} elements",
            self.project,
            registry.element_count()
        );
        doc.projects.insert(self.project.clone(), project);
        doc
    }
}

//! Cross-reference checks for indexed documents

use std::fmt;

use super::{Index, ProjectModel, ThreatModelDocument};

/// Relation section of a project model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModelSection {
    Exposes,
    Sends,
    Mitigates,
}

impl ModelSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSection::Exposes => "exposes",
            ModelSection::Sends => "sends",
            ModelSection::Mitigates => "mitigates",
        }
    }
}

impl fmt::Display for ModelSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference that does not resolve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `field` names the entry attribute (`boundary`, `srcboundary`, ...)
    Boundary { field: &'static str, index: Index },
    Component { field: &'static str, index: Index },
    Threat(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Boundary { field, index } => write!(f, "{} {} is not a known boundary", field, index),
            Reference::Component { field, index } => write!(f, "{} {} is not a known component", field, index),
            Reference::Threat(key) => write!(f, "threat {} is not in the threat catalog", key),
        }
    }
}

/// A dangling reference found in a project model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{project}: {section}[{index}]: {reference}")]
pub struct IntegrityIssue {
    pub project: String,
    pub section: ModelSection,
    pub index: Index,
    pub reference: Reference,
}

struct ProjectChecker<'a> {
    doc: &'a ThreatModelDocument,
    project: &'a str,
    issues: Vec<IntegrityIssue>,
}

impl<'a> ProjectChecker<'a> {
    fn push(&mut self, section: ModelSection, index: Index, reference: Reference) {
        self.issues.push(IntegrityIssue {
            project: self.project.to_string(),
            section,
            index,
            reference,
        });
    }

    fn boundary(&mut self, section: ModelSection, index: Index, field: &'static str, value: Index) {
        if self.doc.boundary(self.project, value).is_none() {
            self.push(section, index, Reference::Boundary { field, index: value });
        }
    }

    fn component(&mut self, section: ModelSection, index: Index, field: &'static str, value: Index) {
        if self.doc.component(self.project, value).is_none() {
            self.push(section, index, Reference::Component { field, index: value });
        }
    }

    fn threat(&mut self, section: ModelSection, index: Index, key: &str) {
        if self.doc.threat_label(key).is_none() {
            self.push(section, index, Reference::Threat(key.to_string()));
        }
    }

    fn run(mut self, model: &ProjectModel) -> Vec<IntegrityIssue> {
        use ModelSection::*;

        for (&i, e) in &model.exposes {
            self.boundary(Exposes, i, "boundary", e.boundary);
            self.component(Exposes, i, "component", e.component);
            self.threat(Exposes, i, &e.threat);
        }
        for (&i, s) in &model.sends {
            self.boundary(Sends, i, "srcboundary", s.srcboundary);
            self.component(Sends, i, "srccomponent", s.srccomponent);
            self.boundary(Sends, i, "dstboundary", s.dstboundary);
            self.component(Sends, i, "dstcomponent", s.dstcomponent);
        }
        for (&i, m) in &model.mitigates {
            self.boundary(Mitigates, i, "boundary", m.boundary);
            self.component(Mitigates, i, "component", m.component);
            self.threat(Mitigates, i, &m.threat);
        }
        self.issues
    }
}

impl ThreatModelDocument {
    /// Find every boundary, component or threat reference that does not resolve
    ///
    /// Indices resolve within the same project; threat keys resolve against
    /// the shared catalog.
    pub fn check(&self) -> Vec<IntegrityIssue> {
        self.models
            .iter()
            .flat_map(|(project, model)| {
                ProjectChecker {
                    doc: self,
                    project,
                    issues: Vec::new(),
                }
                .run(model)
            })
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.check().is_empty()
    }
}

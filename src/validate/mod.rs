//! Validation of intermediate documents
//!
//! Two layers: a JSON schema check of the raw document, and a reference check
//! making sure every identifier used by an element or a data flow resolves.

use std::fmt;
use std::path::Path;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::Element;
use crate::report::ReportDocument;

/// Schema of the intermediate document
pub const DEFAULT_SCHEMA: &str = include_str!("schema.json");

/// Error type for schema loading
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("Failed to read schema: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Schema is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

/// Result of validating one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Errors counted as problems
    pub problems: Vec<String>,
    /// Errors dropped because of the relax level
    pub ignored: Vec<String>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Draft 4 schema validator
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    /// Validator for the built-in schema
    pub fn new() -> Result<Self, ValidateError> {
        Self::from_value(&serde_json::from_str(DEFAULT_SCHEMA)?)
    }

    /// Validator for a schema file
    pub fn from_file(path: &Path) -> Result<Self, ValidateError> {
        info!("Loading schema file {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_value(&serde_json::from_str(&content)?)
    }

    pub fn from_value(schema: &Value) -> Result<Self, ValidateError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(schema)
            .map_err(|err| ValidateError::InvalidSchema(err.to_string()))?;
        Ok(Self { validator })
    }

    /// Validate a document
    ///
    /// `relax` >= 1 ignores `additionalProperties` errors, `relax` >= 2 also
    /// ignores `required` errors.
    pub fn validate(&self, instance: &Value, relax: u8) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        for error in self.validator.iter_errors(instance) {
            let ignore = match error.kind() {
                ValidationErrorKind::AdditionalProperties { .. } => relax >= 1,
                ValidationErrorKind::Required { .. } => relax >= 2,
                _ => false,
            };
            let path = error.instance_path().as_str();
            let message = if path.is_empty() {
                error.to_string()
            } else {
                format!("{} at {}", error, path)
            };
            if ignore {
                debug!("Ignoring error: {}", message);
                outcome.ignored.push(message);
            } else {
                outcome.problems.push(message);
            }
        }
        outcome
    }
}

/// Kind of identifier that failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Boundary,
    Component,
    Threat,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Boundary => "boundary",
            ReferenceKind::Component => "component",
            ReferenceKind::Threat => "threat",
        }
    }
}

/// An identifier used without being declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceIssue {
    /// `project/kind` for elements, `dfd` for data flows
    pub context: String,
    pub kind: ReferenceKind,
    pub id: String,
    /// `file@line` of the tag
    pub location: String,
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: unknown {} {} ({})",
            self.context,
            self.kind.as_str(),
            self.id,
            self.location
        )
    }
}

/// Check that every identifier used in a document is declared in it
pub fn check_references(doc: &ReportDocument) -> Vec<ReferenceIssue> {
    let mut issues = Vec::new();

    let mut check_component = |context: &str, boundary: &str, component: &str, location: String| {
        if !doc.boundaries.contains_key(boundary) {
            issues.push(ReferenceIssue {
                context: context.to_string(),
                kind: ReferenceKind::Boundary,
                id: boundary.to_string(),
                location: location.clone(),
            });
        }
        if doc.component(boundary, component).is_none() {
            issues.push(ReferenceIssue {
                context: context.to_string(),
                kind: ReferenceKind::Component,
                id: format!("{}:{}", boundary, component),
                location: location.clone(),
            });
        }
        location
    };

    let mut threat_issues = Vec::new();
    for (project, report) in &doc.projects {
        for element in report.elements() {
            let context = format!("{}/{}", project, element.kind());
            let location = check_component(
                &context,
                element.boundary(),
                element.component(),
                element.source().to_string(),
            );
            if let Some(threat) = element.threat() {
                if !doc.threats.contains_key(threat) {
                    threat_issues.push(ReferenceIssue {
                        context,
                        kind: ReferenceKind::Threat,
                        id: threat.to_string(),
                        location,
                    });
                }
            }
        }
    }

    for connection in doc.dfd.connections() {
        let location = connection.edge.source.to_string();
        check_component("dfd", &connection.source_boundary, &connection.source_component, location.clone());
        check_component("dfd", &connection.dest_boundary, &connection.dest_component, location);
    }

    issues.extend(threat_issues);
    issues
}

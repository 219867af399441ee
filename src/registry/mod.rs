//! Threat registry
//!
//! Collects boundaries, components, threats, the data flow diagram and the
//! project elements (mitigations, exposures, ...) as tags are applied.
//! Boundaries and components are linked together either by an `@alias` tag
//! or implicitly when a tag names them:
//!
//! ```text
//! @alias boundary @user to User
//! @mitigates User:@session against session hijack with use of tokens
//! ```

mod error;
mod tags;

pub use error::TagError;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::comment::{TagComment, TagKind};
use crate::domain::{
    is_empty_identifier, is_identifier, text_to_identifier, Acceptance, Boundary, Component, Dfd, Exposure,
    Mitigation, Review, Threat, Transfer,
};
use crate::report::ReportDocument;

/// Elements grouped by the identifier of their text
pub type ElementMap<T> = BTreeMap<String, Vec<T>>;

/// Current time in milliseconds since the epoch
pub fn current_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// All threat model data gathered from tags
#[derive(Debug, Clone)]
pub struct ThreatRegistry {
    /// Creation time (ms since epoch)
    pub created: i64,
    /// Last update time (ms since epoch)
    pub updated: i64,

    pub boundaries: BTreeMap<String, Boundary>,
    /// boundary id -> component id -> component
    pub components: BTreeMap<String, BTreeMap<String, Component>>,
    pub threats: BTreeMap<String, Threat>,
    pub dfd: Dfd,

    pub mitigations: ElementMap<Mitigation>,
    pub exposures: ElementMap<Exposure>,
    pub transfers: ElementMap<Transfer>,
    pub acceptances: ElementMap<Acceptance>,
    pub reviews: ElementMap<Review>,
}

impl Default for ThreatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreatRegistry {
    pub fn new() -> Self {
        let now = current_millis();
        Self {
            created: now,
            updated: now,
            boundaries: BTreeMap::new(),
            components: BTreeMap::new(),
            threats: BTreeMap::new(),
            dfd: Dfd::new(),
            mitigations: BTreeMap::new(),
            exposures: BTreeMap::new(),
            transfers: BTreeMap::new(),
            acceptances: BTreeMap::new(),
            reviews: BTreeMap::new(),
        }
    }

    /// Resolve the identifier for a name, or None if `name` already is one.
    fn resolve_id(
        class: &'static str,
        name: &str,
        id: Option<&str>,
    ) -> Result<Option<String>, TagError> {
        match id {
            Some(_) if is_identifier(name) => Err(TagError::IdentifierConflict {
                class,
                name: name.to_string(),
            }),
            None if is_identifier(name) => Ok(None),
            Some(id) => Ok(Some(id.to_string())),
            None => {
                let id = text_to_identifier(name);
                if is_empty_identifier(&id) {
                    return Err(TagError::EmptyIdentifier {
                        class,
                        name: name.to_string(),
                    });
                }
                Ok(Some(id))
            }
        }
    }

    /// Add a boundary and return its identifier
    ///
    /// `boundary` is either an identifier (returned as-is, nothing is registered)
    /// or a name. When `boundary_id` is given, `boundary` must be a name.
    /// The first name registered for an identifier wins.
    pub fn add_boundary(&mut self, boundary: &str, boundary_id: Option<&str>) -> Result<String, TagError> {
        let Some(id) = Self::resolve_id("boundary", boundary, boundary_id)? else {
            return Ok(boundary.to_string());
        };
        self.boundaries
            .entry(id.clone())
            .or_insert_with(|| Boundary::new(boundary));
        Ok(id)
    }

    /// Add a component inside a boundary and return its identifier
    pub fn add_component(
        &mut self,
        boundary_id: &str,
        component: &str,
        component_id: Option<&str>,
    ) -> Result<String, TagError> {
        let Some(id) = Self::resolve_id("component", component, component_id)? else {
            return Ok(component.to_string());
        };
        self.components
            .entry(boundary_id.to_string())
            .or_default()
            .entry(id.clone())
            .or_insert_with(|| Component::new(component));
        Ok(id)
    }

    /// Add a threat and return its identifier
    pub fn add_threat(&mut self, threat: &str, threat_id: Option<&str>) -> Result<String, TagError> {
        let Some(id) = Self::resolve_id("threat", threat, threat_id)? else {
            return Ok(threat.to_string());
        };
        self.threats
            .entry(id.clone())
            .or_insert_with(|| Threat::new(threat));
        Ok(id)
    }

    /// Apply a single tag
    pub fn apply(&mut self, tag: &TagComment) -> Result<(), TagError> {
        debug!("Applying {} from {}", tag.kind, tag.source);
        match tag.kind {
            TagKind::Alias => self.parse_alias(&tag.text, &tag.source),
            TagKind::Describe => self.parse_describe(&tag.text, &tag.source),
            TagKind::Connects => self.parse_connects(&tag.text, &tag.source),
            TagKind::Review => self.parse_review(&tag.text, &tag.source),
            TagKind::Mitigates => self.parse_mitigates(&tag.text, &tag.source),
            TagKind::Exposes => self.parse_exposes(&tag.text, &tag.source),
            TagKind::Transfers => self.parse_transfers(&tag.text, &tag.source),
            TagKind::Accepts => self.parse_accepts(&tag.text, &tag.source),
        }
    }

    /// Apply many tags, collecting failures instead of stopping at the first one
    ///
    /// `@alias` tags are applied first so names declared anywhere in the tree
    /// take precedence over names derived from free text in other tags, and
    /// `@describe` tags last so they can refer to anything declared.
    pub fn apply_all(&mut self, tags: &[TagComment]) -> Vec<TagError> {
        let mut ordered: Vec<&TagComment> = tags.iter().collect();
        ordered.sort_by_key(|t| t.kind.apply_order());

        let mut errors = Vec::new();
        for tag in ordered {
            if let Err(e) = self.apply(tag) {
                warn!("{}", e);
                errors.push(e);
            }
        }
        errors
    }

    /// Import boundaries, components and threats from another document
    ///
    /// Used to preload threat libraries (e.g. a CWE catalog) so tags can refer
    /// to their identifiers. Existing entries are kept.
    pub fn import_catalog(&mut self, doc: &ReportDocument) {
        for (id, boundary) in &doc.boundaries {
            self.boundaries.entry(id.clone()).or_insert_with(|| boundary.clone());
        }
        for (boundary_id, components) in &doc.components {
            let entry = self.components.entry(boundary_id.clone()).or_default();
            for (id, component) in components {
                entry.entry(id.clone()).or_insert_with(|| component.clone());
            }
        }
        for (id, threat) in &doc.threats {
            self.threats.entry(id.clone()).or_insert_with(|| threat.clone());
        }
        debug!(
            "Imported catalog: {} boundaries, {} threats",
            doc.boundaries.len(),
            doc.threats.len()
        );
    }

    /// Total number of project elements recorded
    pub fn element_count(&self) -> usize {
        fn count<T>(map: &ElementMap<T>) -> usize {
            map.values().map(Vec::len).sum()
        }
        count(&self.mitigations)
            + count(&self.exposures)
            + count(&self.transfers)
            + count(&self.acceptances)
            + count(&self.reviews)
    }
}

//! Tag grammar
//!
//! ```text
//! @alias (boundary|threat) @id to NAME
//! @alias component @boundary:@component to NAME
//! @describe (boundary|threat) @id as TEXT
//! @describe component @boundary:@component as TEXT
//! @connects B:C (to|with) B:C [as NAME]
//! @review B:C TEXT
//! @mitigates B:C against THREAT with TEXT
//! @exposes B:C to THREAT with TEXT
//! @transfers THREAT to B:C with TEXT
//! @accepts THREAT to B:C with TEXT
//! ```
//!
//! Components may be API paths (`@web:/api/v0/users`).

use once_cell::sync::Lazy;
use regex::Regex;

use super::{ThreatRegistry, TagError};
use crate::comment::TagKind;
use crate::domain::{
    remove_excessive_space, text_to_identifier, Acceptance, Connection, ConnectionType, Exposure,
    Mitigation, Review, SourceMeta, Transfer,
};

const BOUNDARY: &str = r"(@?\w+)";
const COMPONENT: &str = r"(@?[\w/.\-]+)";

fn compile(pattern: String) -> Regex {
    Regex::new(&format!("(?is){}", pattern)).expect("tag grammar is valid")
}

static ALIAS: Lazy<Regex> = Lazy::new(|| {
    compile(r"^@alias\s+(boundary|component|threat)\s+@(\w+)(?::@([\w/.\-]+))?\s+to\s+(.+)$".to_string())
});

static DESCRIBE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^@describe\s+(boundary|component|threat)\s+@(\w+)(?::@([\w/.\-]+))?\s+as\s+(.+)$".to_string())
});

static CONNECTS: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^@connects\s+{b}:{c}\s+(to|with)\s+{b}:{c}(?:\s+as\s+(.+))?$",
        b = BOUNDARY,
        c = COMPONENT
    ))
});

static REVIEW: Lazy<Regex> = Lazy::new(|| {
    compile(format!(r"^@review\s+{}:{}\s+(.+)$", BOUNDARY, COMPONENT))
});

static MITIGATES: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^@mitigates\s+{}:{}\s+against\s+(.+?)\s+with\s+(.+)$",
        BOUNDARY, COMPONENT
    ))
});

static EXPOSES: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^@exposes\s+{}:{}\s+to\s+(.+?)\s+with\s+(.+)$",
        BOUNDARY, COMPONENT
    ))
});

static TRANSFERS: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^@transfers\s+(.+?)\s+to\s+{}:{}\s+with\s+(.+)$",
        BOUNDARY, COMPONENT
    ))
});

static ACCEPTS: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        r"^@accepts\s+(.+?)\s+to\s+{}:{}\s+with\s+(.+)$",
        BOUNDARY, COMPONENT
    ))
});

/// Trailing reference list, e.g. `(#123, #456)` or `(https://example.com/issue/1)`
static REFS: Lazy<Regex> = Lazy::new(|| compile(r"^(.*?)\s*\(([^()]*)\)\s*$".to_string()));

/// Split a trailing reference list off an element's text
///
/// The group is only treated as references if every item is an issue
/// reference (`#123`) or a URL; otherwise the text is left alone.
pub(crate) fn split_refs(text: &str) -> (String, Vec<String>) {
    let Some(captures) = REFS.captures(text) else {
        return (text.to_string(), Vec::new());
    };

    let body = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let refs: Vec<String> = captures
        .get(2)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(',')
        .map(|r| r.trim().to_string())
        .collect();

    let is_ref = |r: &String| {
        (r.len() > 1 && r.starts_with('#') && !r.contains(char::is_whitespace)) || r.contains("://")
    };

    if body.is_empty() || refs.is_empty() || !refs.iter().all(is_ref) {
        return (text.to_string(), Vec::new());
    }
    (body.to_string(), refs)
}

fn group(captures: &regex::Captures<'_>, idx: usize) -> String {
    captures
        .get(idx)
        .map(|m| remove_excessive_space(m.as_str()))
        .unwrap_or_default()
}

impl ThreatRegistry {
    fn invalid(tag: TagKind, meta: &SourceMeta) -> TagError {
        TagError::InvalidPattern {
            tag,
            location: meta.clone(),
        }
    }

    /// Register the boundary and component of a `B:C` pair
    fn add_pair(&mut self, boundary: &str, component: &str) -> Result<(String, String), TagError> {
        let boundary_id = self.add_boundary(boundary, None)?;
        let component_id = self.add_component(&boundary_id, component, None)?;
        Ok((boundary_id, component_id))
    }

    /// `@alias boundary @external to External System`
    pub(super) fn parse_alias(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = ALIAS
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Alias, meta))?;

        let class = group(&captures, 1).to_lowercase();
        let id = text_to_identifier(&group(&captures, 2));
        let name = group(&captures, 4);

        match class.as_str() {
            "component" => {
                let component = captures
                    .get(3)
                    .map(|m| text_to_identifier(m.as_str()))
                    .ok_or_else(|| Self::invalid(TagKind::Alias, meta))?;
                self.add_component(&id, &name, Some(&component))?;
            }
            "boundary" => {
                self.add_boundary(&name, Some(&id))?;
            }
            _ => {
                self.add_threat(&name, Some(&id))?;
            }
        }
        Ok(())
    }

    /// `@describe threat @cwe_123 as any disclosure of private data`
    pub(super) fn parse_describe(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = DESCRIBE
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Describe, meta))?;

        let class = group(&captures, 1).to_lowercase();
        let id = text_to_identifier(&group(&captures, 2));
        let description = group(&captures, 4);

        let unknown = |class: &'static str, id: &str| TagError::UnknownEntry {
            class,
            id: id.to_string(),
            location: meta.clone(),
        };

        match class.as_str() {
            "component" => {
                let component_id = captures
                    .get(3)
                    .map(|m| text_to_identifier(m.as_str()))
                    .ok_or_else(|| Self::invalid(TagKind::Describe, meta))?;
                let components =
                    self.components
                        .get_mut(&id)
                        .ok_or_else(|| TagError::UnknownBoundary {
                            id: id.clone(),
                            location: meta.clone(),
                        })?;
                let component = components
                    .get_mut(&component_id)
                    .ok_or_else(|| unknown("component", &component_id))?;
                component.description = description;
            }
            "boundary" => {
                let boundary = self
                    .boundaries
                    .get_mut(&id)
                    .ok_or_else(|| unknown("boundary", &id))?;
                boundary.description = description;
            }
            _ => {
                let threat = self
                    .threats
                    .get_mut(&id)
                    .ok_or_else(|| unknown("threat", &id))?;
                threat.description = description;
            }
        }
        Ok(())
    }

    /// `@connects @external:@user to @web:@server as https`
    pub(super) fn parse_connects(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = CONNECTS
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Connects, meta))?;

        let connection_type = if group(&captures, 3).eq_ignore_ascii_case("to") {
            ConnectionType::Uni
        } else {
            ConnectionType::Bi
        };

        let mut connection = Connection::new(
            &group(&captures, 1),
            &group(&captures, 2),
            &group(&captures, 4),
            &group(&captures, 5),
            connection_type,
            meta.clone(),
        );
        if let Some(name) = captures.get(6) {
            connection = connection.with_name(remove_excessive_space(name.as_str()));
        }

        self.dfd.add_edge(connection);
        Ok(())
    }

    /// `@review @auth:@encryption Not sure what happens here`
    pub(super) fn parse_review(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = REVIEW
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Review, meta))?;

        let (boundary_id, component_id) = self.add_pair(&group(&captures, 1), &group(&captures, 2))?;
        let (review_text, refs) = split_refs(&group(&captures, 3));

        let mut review = Review::new(boundary_id, component_id, review_text.clone(), meta.clone());
        review.refs = refs;
        self.reviews
            .entry(text_to_identifier(&review_text))
            .or_default()
            .push(review);
        Ok(())
    }

    /// `@mitigates @crypto:@hash against @cwe_123 with use of random salt`
    pub(super) fn parse_mitigates(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = MITIGATES
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Mitigates, meta))?;

        let (boundary_id, component_id) = self.add_pair(&group(&captures, 1), &group(&captures, 2))?;
        let threat_id = self.add_threat(&group(&captures, 3), None)?;
        let (mitigation_text, refs) = split_refs(&group(&captures, 4));

        let mitigation = Mitigation::new(
            boundary_id,
            component_id,
            threat_id,
            mitigation_text.clone(),
            meta.clone(),
        )
        .with_refs(refs);
        self.mitigations
            .entry(text_to_identifier(&mitigation_text))
            .or_default()
            .push(mitigation);
        Ok(())
    }

    /// `@exposes @crypto:@hash to @cwe_123 with no salt used`
    pub(super) fn parse_exposes(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = EXPOSES
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Exposes, meta))?;

        let (boundary_id, component_id) = self.add_pair(&group(&captures, 1), &group(&captures, 2))?;
        let threat_id = self.add_threat(&group(&captures, 3), None)?;
        let (exposure_text, refs) = split_refs(&group(&captures, 4));

        let exposure = Exposure::new(
            boundary_id,
            component_id,
            threat_id,
            exposure_text.clone(),
            meta.clone(),
        )
        .with_refs(refs);
        self.exposures
            .entry(text_to_identifier(&exposure_text))
            .or_default()
            .push(exposure);
        Ok(())
    }

    /// `@transfers @cwe_319 to User:Browser with non-sensitive information`
    pub(super) fn parse_transfers(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = TRANSFERS
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Transfers, meta))?;

        let threat_id = self.add_threat(&group(&captures, 1), None)?;
        let (boundary_id, component_id) = self.add_pair(&group(&captures, 2), &group(&captures, 3))?;
        let (transfer_text, refs) = split_refs(&group(&captures, 4));

        let transfer = Transfer::new(
            boundary_id,
            component_id,
            threat_id,
            transfer_text.clone(),
            meta.clone(),
        )
        .with_refs(refs);
        self.transfers
            .entry(text_to_identifier(&transfer_text))
            .or_default()
            .push(transfer);
        Ok(())
    }

    /// `@accepts arbitrary file writes to WebApp:FileSystem with limited filenames`
    pub(super) fn parse_accepts(&mut self, text: &str, meta: &SourceMeta) -> Result<(), TagError> {
        let captures = ACCEPTS
            .captures(text)
            .ok_or_else(|| Self::invalid(TagKind::Accepts, meta))?;

        let threat_id = self.add_threat(&group(&captures, 1), None)?;
        let (boundary_id, component_id) = self.add_pair(&group(&captures, 2), &group(&captures, 3))?;
        let (acceptance_text, refs) = split_refs(&group(&captures, 4));

        let acceptance = Acceptance::new(
            boundary_id,
            component_id,
            threat_id,
            acceptance_text.clone(),
            meta.clone(),
        )
        .with_refs(refs);
        self.acceptances
            .entry(text_to_identifier(&acceptance_text))
            .or_default()
            .push(acceptance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::TagComment;
    use crate::domain::ConnectionType;

    fn apply(registry: &mut ThreatRegistry, kind: TagKind, text: &str) -> Result<(), TagError> {
        registry.apply(&TagComment {
            kind,
            text: text.to_string(),
            source: SourceMeta::default(),
        })
    }

    #[test]
    fn test_alias_invalid_pattern() {
        let mut registry = ThreatRegistry::new();
        let result = apply(&mut registry, TagKind::Alias, "@alias badger likes to drink tea");
        assert!(matches!(result, Err(TagError::InvalidPattern { tag: TagKind::Alias, .. })));
    }

    #[test]
    fn test_alias_boundary() {
        let mut registry = ThreatRegistry::new();
        apply(&mut registry, TagKind::Alias, "@alias boundary @boundary to A boundary").unwrap();
        assert_eq!(registry.boundaries["@boundary"].name, "A boundary");
    }

    #[test]
    fn test_alias_boundary_multiline() {
        let mut registry = ThreatRegistry::new();
        apply(
            &mut registry,
            TagKind::Alias,
            "@alias boundary @boundary to A boundary\\\nwith multi lines",
        )
        .unwrap();
        assert_eq!(registry.boundaries["@boundary"].name, "A boundary with multi lines");
    }

    #[test]
    fn test_alias_component_and_threat() {
        let mut registry = ThreatRegistry::new();
        apply(&mut registry, TagKind::Alias, "@alias component @boundary:@component to A component").unwrap();
        apply(&mut registry, TagKind::Alias, "@alias threat @threat to A threat").unwrap();
        assert_eq!(registry.components["@boundary"]["@component"].name, "A component");
        assert_eq!(registry.threats["@threat"].name, "A threat");
    }

    #[test]
    fn test_alias_component_requires_pair() {
        let mut registry = ThreatRegistry::new();
        assert!(apply(&mut registry, TagKind::Alias, "@alias component @component to A component").is_err());
    }

    #[test]
    fn test_describe() {
        let mut registry = ThreatRegistry::new();

        let result = apply(&mut registry, TagKind::Describe, "@describe boundary @boundary as a boundary");
        assert!(matches!(result, Err(TagError::UnknownEntry { class: "boundary", .. })));

        registry.add_boundary("boundary", None).unwrap();
        apply(&mut registry, TagKind::Describe, "@describe boundary @boundary as a boundary").unwrap();
        assert_eq!(registry.boundaries["@boundary"].description, "a boundary");
    }

    #[test]
    fn test_describe_component() {
        let mut registry = ThreatRegistry::new();
        let text = "@describe component @boundary:@component as a component";

        let result = apply(&mut registry, TagKind::Describe, text);
        assert!(matches!(result, Err(TagError::UnknownBoundary { .. })));

        registry.add_component("@boundary", "other", None).unwrap();
        let result = apply(&mut registry, TagKind::Describe, text);
        assert!(matches!(result, Err(TagError::UnknownEntry { class: "component", .. })));

        registry.add_component("@boundary", "component", None).unwrap();
        apply(&mut registry, TagKind::Describe, text).unwrap();
        assert_eq!(registry.components["@boundary"]["@component"].description, "a component");
    }

    #[test]
    fn test_describe_threat() {
        let mut registry = ThreatRegistry::new();
        assert!(apply(&mut registry, TagKind::Describe, "@describe threat @threat as a threat").is_err());
        registry.add_threat("threat", None).unwrap();
        apply(&mut registry, TagKind::Describe, "@describe threat @threat as a threat").unwrap();
        assert_eq!(registry.threats["@threat"].description, "a threat");
    }

    #[test]
    fn test_exposes_unicode_names() {
        let mut registry = ThreatRegistry::new();
        apply(&mut registry, TagKind::Exposes, "@exposes Web:数据库 to 注入 with 未过滤的查询").unwrap();
        apply(&mut registry, TagKind::Exposes, "@exposes Web:日志 to 泄露 with 明文日志").unwrap();

        assert_eq!(registry.components["@web"].len(), 2);
        assert_eq!(registry.components["@web"]["@日志"].name, "日志");
        assert_eq!(registry.threats["@泄露"].name, "泄露");
        assert_eq!(registry.exposures["@明文日志"][0].component, "@日志");
    }

    #[test]
    fn test_exposes_without_identifier_characters() {
        let mut registry = ThreatRegistry::new();
        let result = apply(&mut registry, TagKind::Exposes, "@exposes Web:App to ?? with nothing");
        assert!(matches!(result, Err(TagError::EmptyIdentifier { class: "threat", .. })));
        assert!(registry.exposures.is_empty());
    }

    #[test]
    fn test_connects() {
        let mut registry = ThreatRegistry::new();
        assert!(apply(&mut registry, TagKind::Connects, "@connects badger likes to drink tea").is_err());

        apply(&mut registry, TagKind::Connects, "@connects @src_boundary:@src_component to @dst_boundary:@dst_component").unwrap();
        let edge = registry.dfd.edge("@src_boundary", "@src_component", "@dst_boundary", "@dst_component").unwrap();
        assert_eq!(edge.connection_type, ConnectionType::Uni);

        apply(&mut registry, TagKind::Connects, "@connects @a:@b with @c:@d as important/connection").unwrap();
        let edge = registry.dfd.edge("@a", "@b", "@c", "@d").unwrap();
        assert_eq!(edge.connection_type, ConnectionType::Bi);
        assert_eq!(edge.name.as_deref(), Some("important/connection"));
    }

    #[test]
    fn test_connects_api_friendly() {
        let mut registry = ThreatRegistry::new();
        apply(
            &mut registry,
            TagKind::Connects,
            "@connects @src_boundary:/api/v0/path/to/source to @dst_boundary:/api/v0/path/to/dest",
        )
        .unwrap();
        assert!(registry
            .dfd
            .edge("@src_boundary", "@api_v0_path_to_source", "@dst_boundary", "@api_v0_path_to_dest")
            .is_some());
    }

    #[test]
    fn test_review() {
        let mut registry = ThreatRegistry::new();
        assert!(apply(&mut registry, TagKind::Review, "@review badger likes to drink tea").is_err());

        apply(&mut registry, TagKind::Review, "@review @boundary:@component a review").unwrap();
        assert!(registry.boundaries.is_empty());
        assert!(registry.components.is_empty());
        assert_eq!(registry.reviews["@a_review"][0].review, "a review");

        apply(&mut registry, TagKind::Review, "@review boundary:component a review").unwrap();
        assert!(registry.boundaries.contains_key("@boundary"));
        assert!(registry.components["@boundary"].contains_key("@component"));
        assert_eq!(registry.reviews["@a_review"].len(), 2);
    }

    #[test]
    fn test_mitigates() {
        let mut registry = ThreatRegistry::new();
        assert!(apply(&mut registry, TagKind::Mitigates, "@mitigates badger likes to drink tea").is_err());

        apply(&mut registry, TagKind::Mitigates, "@mitigates @boundary:component against threat with mitigation").unwrap();
        assert!(!registry.boundaries.contains_key("@boundary"));
        assert!(registry.components["@boundary"].contains_key("@component"));
        assert_eq!(registry.threats["@threat"].name, "threat");

        let mitigation = &registry.mitigations["@mitigation"][0];
        assert_eq!(mitigation.mitigation, "mitigation");
        assert_eq!(mitigation.boundary, "@boundary");
        assert_eq!(mitigation.component, "@component");
        assert_eq!(mitigation.threat, "@threat");
    }

    #[test]
    fn test_mitigates_api_friendly() {
        let mut registry = ThreatRegistry::new();
        apply(
            &mut registry,
            TagKind::Mitigates,
            "@mitigates @boundary:/api/v0/path/to/something against threat with mitigation",
        )
        .unwrap();
        let component = &registry.components["@boundary"]["@api_v0_path_to_something"];
        assert_eq!(component.name, "/api/v0/path/to/something");
    }

    #[test]
    fn test_exposes_with_refs() {
        let mut registry = ThreatRegistry::new();
        apply(
            &mut registry,
            TagKind::Exposes,
            "@exposes @webapp:App to XSS injection with insufficient input validation. (#567,#123, #41234)",
        )
        .unwrap();

        let exposure = &registry.exposures["@insufficient_input_validation"][0];
        assert_eq!(exposure.exposure, "insufficient input validation.");
        assert_eq!(exposure.refs, vec!["#567", "#123", "#41234"]);
        assert_eq!(exposure.threat, "@xss_injection");
        assert_eq!(registry.components["@webapp"]["@app"].name, "App");
    }

    #[test]
    fn test_transfers_and_accepts() {
        let mut registry = ThreatRegistry::new();
        assert!(apply(&mut registry, TagKind::Transfers, "@transfers badger likes to drink tea").is_err());
        assert!(apply(&mut registry, TagKind::Accepts, "@accepts badger likes to drink tea").is_err());

        apply(&mut registry, TagKind::Transfers, "@transfers threat to @boundary:@component with transfer").unwrap();
        apply(&mut registry, TagKind::Accepts, "@accepts threat to boundary:@component with acceptance").unwrap();

        assert_eq!(registry.transfers["@transfer"][0].transfer, "transfer");
        assert_eq!(registry.acceptances["@acceptance"][0].acceptance, "acceptance");
        assert_eq!(registry.acceptances["@acceptance"][0].boundary, "@boundary");
        assert!(registry.boundaries.contains_key("@boundary"));
        assert_eq!(registry.threats["@threat"].name, "threat");
    }

    #[test]
    fn test_split_refs() {
        assert_eq!(
            split_refs("strict file permissions (#123)"),
            ("strict file permissions".to_string(), vec!["#123".to_string()])
        );
        assert_eq!(
            split_refs("tls (https://example.com/tls)"),
            ("tls".to_string(), vec!["https://example.com/tls".to_string()])
        );
        // Not a reference list
        assert_eq!(
            split_refs("hashing (bcrypt)"),
            ("hashing (bcrypt)".to_string(), Vec::new())
        );
        assert_eq!(split_refs("plain"), ("plain".to_string(), Vec::new()));
    }
}

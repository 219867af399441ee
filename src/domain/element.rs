//! Threat model elements
//!
//! An element is anything tied to a boundary/component pair: mitigations,
//! exposures, transfers, acceptances (which also reference a threat) and
//! reviews (which don't). In the intermediate document they are grouped by
//! the identifier of their text:
//!
//! ```json
//! "mitigations": {
//!     "@use_of_tls": [
//!         {
//!             "boundary": "@web",
//!             "component": "@loadbalancers",
//!             "threat": "@information_disclosure_in_transit",
//!             "mitigation": "use of TLS",
//!             "refs": [],
//!             "source": { "file": "example.py", "line": 32, "function": "universal" }
//!         }
//!     ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::SourceMeta;

/// Kind of element, used in messages and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Mitigation,
    Exposure,
    Transfer,
    Acceptance,
    Review,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Mitigation => "mitigation",
            ElementKind::Exposure => "exposure",
            ElementKind::Transfer => "transfer",
            ElementKind::Acceptance => "acceptance",
            ElementKind::Review => "review",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common view over all element types
pub trait Element {
    fn kind(&self) -> ElementKind;
    fn boundary(&self) -> &str;
    fn component(&self) -> &str;
    /// The threat this element refers to (None for reviews)
    fn threat(&self) -> Option<&str>;
    /// The free text of the element
    fn text(&self) -> &str;
    fn refs(&self) -> &[String];
    fn source(&self) -> &SourceMeta;
}

macro_rules! threat_element {
    ($(#[$doc:meta])* $name:ident, $field:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub boundary: String,
            pub component: String,
            pub threat: String,
            pub $field: String,
            #[serde(default)]
            pub refs: Vec<String>,
            pub source: SourceMeta,
        }

        impl $name {
            pub fn new(
                boundary: impl Into<String>,
                component: impl Into<String>,
                threat: impl Into<String>,
                $field: impl Into<String>,
                source: SourceMeta,
            ) -> Self {
                Self {
                    boundary: boundary.into(),
                    component: component.into(),
                    threat: threat.into(),
                    $field: $field.into(),
                    refs: Vec::new(),
                    source,
                }
            }

            pub fn with_refs(mut self, refs: Vec<String>) -> Self {
                self.refs = refs;
                self
            }
        }

        impl Element for $name {
            fn kind(&self) -> ElementKind {
                $kind
            }
            fn boundary(&self) -> &str {
                &self.boundary
            }
            fn component(&self) -> &str {
                &self.component
            }
            fn threat(&self) -> Option<&str> {
                Some(&self.threat)
            }
            fn text(&self) -> &str {
                &self.$field
            }
            fn refs(&self) -> &[String] {
                &self.refs
            }
            fn source(&self) -> &SourceMeta {
                &self.source
            }
        }
    };
}

threat_element!(
    /// `@mitigates` - the code mitigates the threat
    Mitigation,
    mitigation,
    ElementKind::Mitigation
);

threat_element!(
    /// `@exposes` - the code exposes the component to the threat
    Exposure,
    exposure,
    ElementKind::Exposure
);

threat_element!(
    /// `@transfers` - the threat is handed over to another component
    Transfer,
    transfer,
    ElementKind::Transfer
);

threat_element!(
    /// `@accepts` - the threat is knowingly left unmitigated
    Acceptance,
    acceptance,
    ElementKind::Acceptance
);

/// `@review` - a note that a component needs further review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub boundary: String,
    pub component: String,
    pub review: String,
    #[serde(default)]
    pub refs: Vec<String>,
    pub source: SourceMeta,
}

impl Review {
    pub fn new(
        boundary: impl Into<String>,
        component: impl Into<String>,
        review: impl Into<String>,
        source: SourceMeta,
    ) -> Self {
        Self {
            boundary: boundary.into(),
            component: component.into(),
            review: review.into(),
            refs: Vec::new(),
            source,
        }
    }
}

impl Element for Review {
    fn kind(&self) -> ElementKind {
        ElementKind::Review
    }
    fn boundary(&self) -> &str {
        &self.boundary
    }
    fn component(&self) -> &str {
        &self.component
    }
    fn threat(&self) -> Option<&str> {
        None
    }
    fn text(&self) -> &str {
        &self.review
    }
    fn refs(&self) -> &[String] {
        &self.refs
    }
    fn source(&self) -> &SourceMeta {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mitigation_json() {
        let mitigation = Mitigation::new(
            "@boundary",
            "@component",
            "@threat",
            "mitigation",
            SourceMeta::default(),
        );
        let json = serde_json::to_value(&mitigation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "boundary": "@boundary",
                "component": "@component",
                "mitigation": "mitigation",
                "refs": [],
                "source": {"file": "", "function": "", "line": 0},
                "threat": "@threat"
            })
        );
    }

    #[test]
    fn test_acceptance_field_name() {
        let acceptance = Acceptance::new("@b", "@c", "@t", "acceptance", SourceMeta::default());
        let json = serde_json::to_value(&acceptance).unwrap();
        assert_eq!(json["acceptance"], "acceptance");
        assert_eq!(acceptance.kind(), ElementKind::Acceptance);
        assert_eq!(acceptance.threat(), Some("@t"));
    }

    #[test]
    fn test_review_has_no_threat() {
        let review = Review::new("@b", "@c", "a review", SourceMeta::default());
        assert!(review.threat().is_none());
        let json = serde_json::to_value(&review).unwrap();
        assert!(json.get("threat").is_none());
        assert_eq!(json["review"], "a review");
    }

    #[test]
    fn test_refs_default_when_missing() {
        let exposure: Exposure = serde_json::from_str(
            r#"{"boundary":"@b","component":"@c","threat":"@t","exposure":"e",
                "source":{"file":"f","line":1,"function":"universal"}}"#,
        )
        .unwrap();
        assert!(exposure.refs.is_empty());
        assert_eq!(exposure.text(), "e");
    }
}

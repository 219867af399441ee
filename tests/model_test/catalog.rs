//! Tests for threat libraries built from the CWE catalogue

use tempfile::TempDir;
use threatspec::catalog::{library, CweCatalog, SFP_ROOT};
use threatspec::comment::CommentParser;
use threatspec::registry::ThreatRegistry;
use threatspec::report::{ReportDocument, Reporter};
use threatspec::validate::{check_references, SchemaValidator};
use threatspec::SourceMeta;

use super::fixture_path;

const XSS: &str = "@cwe_79_improper_neutralization_of_input_during_web_page_generation_cross_site_scripting";

fn catalog() -> CweCatalog {
    CweCatalog::load(&fixture_path("cwe_sample.xml")).expect("CWE fixture parses")
}

#[test]
fn test_cwe_library() {
    let doc = library(catalog().threats());
    assert_eq!(doc.threats.len(), 3);
    assert!(doc.projects.is_empty());

    let xss = &doc.threats[XSS];
    assert_eq!(
        xss.name,
        "Improper Neutralization of Input During Web Page Generation ('Cross-site Scripting')"
    );
    assert!(xss.description.starts_with("The software does not neutralize"));
    assert!(xss.description.ends_with("enters a web application."));
    assert_eq!(
        xss.references,
        vec!["CWE 79", "https://cwe.mitre.org/data/definitions/79.html"]
    );
    assert!(xss.parent.is_none());

    let value = serde_json::to_value(&doc).unwrap();
    let outcome = SchemaValidator::new().unwrap().validate(&value, 0);
    assert!(outcome.is_valid(), "{:?}", outcome.problems);
}

#[test]
fn test_sfp_library_hierarchy() {
    let doc = library(catalog().sfp_threats().unwrap());
    // two clusters, one sub cluster, two weaknesses; CWE 1004 has no cluster
    assert_eq!(doc.threats.len(), 5);
    assert_eq!(doc.threats["@authentication"].parent.as_deref(), Some(SFP_ROOT));
    assert_eq!(doc.threats[XSS].parent.as_deref(), Some("@tainted_input_to_command"));

    let outline: Vec<(String, usize)> = doc
        .threat_outline()
        .into_iter()
        .map(|n| (n.id, n.depth))
        .collect();
    assert_eq!(
        outline,
        vec![
            (SFP_ROOT.to_string(), 0),
            ("@authentication".to_string(), 1),
            ("@cwe_287_improper_authentication".to_string(), 2),
            ("@tainted_input".to_string(), 1),
            ("@tainted_input_to_command".to_string(), 2),
            (XSS.to_string(), 3),
        ]
    );
}

#[test]
fn test_library_preloaded_for_tags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cwe_library.threatspec.json");
    library(catalog().threats()).save(&path).unwrap();

    let mut registry = ThreatRegistry::new();
    registry.import_catalog(&ReportDocument::load(&path).unwrap());

    let parser = CommentParser::new();
    let text = format!("// @mitigates @web:@page against {} with output encoding", XSS);
    let tag = parser
        .parse_text(&text, SourceMeta::new("page.rs", 1, "universal"))
        .unwrap();
    registry.apply(&tag).unwrap();
    assert_eq!(registry.threats.len(), 3);

    let doc = Reporter::new(&registry, "web").export();
    // the boundary and component are used without an alias
    let dangling: Vec<String> = check_references(&doc).iter().map(|i| i.id.clone()).collect();
    assert!(!dangling.contains(&XSS.to_string()));
}

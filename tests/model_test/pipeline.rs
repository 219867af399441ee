//! Tests for the scan -> register -> export -> convert pipeline

use std::fs;

use tempfile::TempDir;
use threatspec::model::ThreatModelDocument;
use threatspec::openapi::OpenApiExtractor;
use threatspec::registry::ThreatRegistry;
use threatspec::report::{ReportDocument, Reporter};
use threatspec::scanner::Scanner;
use threatspec::validate::{check_references, SchemaValidator};

/// A small web application with tags in three languages
fn source_tree() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let root = dir.path();

    fs::write(
        root.join("aliases.go"),
        "package main\n\
         \n\
         // @alias boundary @webapp to WebApp\n\
         // @alias boundary @internet to Internet\n\
         // @alias component @webapp:@fs to FileSystem\n\
         // @alias component @internet:@browser to Browser\n\
         // @alias component @webapp:@server to Web Server\n\
         // @alias threat @cwe_xxx_yyy to XXX YYY\n\
         // @alias threat @cwe_xxx_zzz to XXX ZZZ\n",
    )
    .unwrap();

    fs::create_dir(root.join("server")).unwrap();
    fs::write(
        root.join("server/upload.py"),
        "def upload(request):\n\
         \x20   # @connects @internet:@browser to @webapp:@server as HTTP request\n\
         \x20   # @connects @webapp:@server to @webapp:@fs as file upload\n\
         \x20   # @exposes @webapp:@fs to @cwe_xxx_yyy with arbitrary file writes\n\
         \x20   pass\n",
    )
    .unwrap();

    fs::write(
        root.join("server/names.js"),
        "/*\n\
         \x20* @mitigates @webapp:@server against @cwe_xxx_zzz \\\n\
         \x20*   with filename sanitisation (#7)\n\
         \x20*/\n\
         function clean(name) { return name.replace(/[^a-z]/g, ''); }\n",
    )
    .unwrap();

    // Not a source file, must be ignored
    fs::write(root.join("threatspec.toml"), "# @review @webapp:@fs not a tag\n").unwrap();
    dir
}

async fn export(dir: &TempDir) -> ReportDocument {
    let tags = Scanner::new(dir.path()).scan().await.unwrap();
    let mut registry = ThreatRegistry::new();
    let errors = registry.apply_all(&tags);
    assert!(errors.is_empty(), "{:?}", errors);
    Reporter::new(&registry, "Project A").export()
}

#[tokio::test]
async fn test_scan_and_export() {
    let dir = source_tree();
    let doc = export(&dir).await;

    assert_eq!(doc.boundaries.len(), 2);
    assert_eq!(doc.component("@webapp", "@server").unwrap().name, "Web Server");
    assert_eq!(doc.threats["@cwe_xxx_yyy"].name, "XXX YYY");

    let project = &doc.projects["Project A"];
    assert_eq!(project.exposures.len(), 1);
    let mitigation = &project.mitigations["@filename_sanitisation"][0];
    assert_eq!(mitigation.refs, vec!["#7".to_string()]);
    assert_eq!(mitigation.source.line, 2);
    assert!(project.reviews.is_empty());

    let edge = doc.dfd.edge("@internet", "@browser", "@webapp", "@server").unwrap();
    assert_eq!(edge.name.as_deref(), Some("HTTP request"));
}

#[tokio::test]
async fn test_exported_document_validates() {
    let dir = source_tree();
    let doc = export(&dir).await;

    let path = dir.path().join("out/Project A.threatspec.json");
    doc.save(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    let outcome = SchemaValidator::new().unwrap().validate(&value, 0);
    assert!(outcome.is_valid(), "{:?}", outcome.problems);
    assert!(check_references(&ReportDocument::load(&path).unwrap()).is_empty());
}

#[tokio::test]
async fn test_convert_to_indexed_model() {
    let dir = source_tree();
    let doc = export(&dir).await;

    let model = ThreatModelDocument::from_report(&doc, "Project A").unwrap();
    assert!(model.is_valid());

    let project = model.model("Project A").unwrap();
    assert_eq!(project.exposes.len(), 1);
    assert_eq!(project.sends.len(), 2);
    assert_eq!(project.mitigates.len(), 1);

    let exposure = &project.exposes[&0];
    assert_eq!(model.threat_label(&exposure.threat), Some("XXX YYY"));
    assert_eq!(model.component("Project A", exposure.component).unwrap().name, "FileSystem");

    let messages: Vec<&str> = project.sends.values().map(|f| f.message.as_str()).collect();
    assert!(messages.contains(&"HTTP request"));
    assert!(messages.contains(&"file upload"));
}

#[test]
fn test_openapi_document_to_model() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("api.yaml");
    fs::write(
        &path,
        r#"openapi: 3.0.0
info:
  title: Uploads
x-threatspec-alias:
  - boundary @api to Upload API
  - component @api:@upload to Upload endpoint
paths:
  /upload:
    post:
      x-threatspec-exposes: "@api:@upload to Path traversal with user supplied names"
      x-threatspec-mitigates: "@api:@upload against Path traversal with canonical paths"
"#,
    )
    .unwrap();

    let tags = OpenApiExtractor::new().load_file(&path).unwrap();
    assert_eq!(tags.len(), 4);

    let mut registry = ThreatRegistry::new();
    assert!(registry.apply_all(&tags).is_empty());
    let doc = Reporter::new(&registry, "api").export();

    let model = ThreatModelDocument::from_report(&doc, "api").unwrap();
    assert!(model.is_valid());
    assert_eq!(model.threat_label("@path_traversal"), Some("Path traversal"));
    assert_eq!(model.boundary("api", 0).unwrap().name, "Upload API");
}

//! Tests for merging documents of several projects

use tempfile::TempDir;
use threatspec::comment::CommentParser;
use threatspec::model::ThreatModelDocument;
use threatspec::registry::ThreatRegistry;
use threatspec::report::{CoverageStatus, ReportDocument, Reporter};
use threatspec::SourceMeta;

fn export(project: &str, lines: &[&str]) -> ReportDocument {
    let parser = CommentParser::new();
    let tags: Vec<_> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| parser.parse_text(line, SourceMeta::new(format!("{}.rs", project), i + 1, "universal")))
        .collect();
    let mut registry = ThreatRegistry::new();
    assert!(registry.apply_all(&tags).is_empty());
    Reporter::new(&registry, project).export()
}

fn documents() -> (ReportDocument, ReportDocument) {
    let frontend = export(
        "frontend",
        &[
            "// @alias boundary @web to Web",
            "// @alias threat @xss to Cross-site scripting",
            "// @exposes @web:@ui to @xss with rendering user content",
            "// @connects @web:@ui to @web:@api as JSON",
        ],
    );
    let backend = export(
        "backend",
        &[
            "// @alias boundary @web to Web frontend",
            "// @mitigates @web:@api against @xss with output encoding",
            "// @accepts Denial of service to @web:@api with rate limiting later",
        ],
    );
    (frontend, backend)
}

#[test]
fn test_merge_files() {
    let (frontend, backend) = documents();
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("frontend.threatspec.json");
    let b = dir.path().join("backend.threatspec.json");
    frontend.save(&a).unwrap();
    backend.save(&b).unwrap();

    let merged = ReportDocument::load_all(&[a, b]).unwrap();
    assert_eq!(merged.projects.len(), 2);
    // first document wins
    assert_eq!(merged.boundaries["@web"].name, "Web");
    assert_eq!(merged.threats["@xss"].name, "Cross-site scripting");
    assert!(merged.threats.contains_key("@denial_of_service"));
    assert!(merged.dfd.edge("@web", "@ui", "@web", "@api").is_some());
}

#[test]
fn test_coverage_across_projects() {
    let (mut merged, backend) = documents();
    merged.merge(backend);

    let coverage = merged.coverage();
    let xss = coverage.iter().find(|c| c.id == "@xss").unwrap();
    assert_eq!(xss.status(), CoverageStatus::Mitigated);
    assert_eq!((xss.exposures, xss.mitigations), (1, 1));

    let dos = coverage.iter().find(|c| c.id == "@denial_of_service").unwrap();
    assert_eq!(dos.status(), CoverageStatus::Accepted);
    assert_eq!(dos.name, "Denial of service");
}

#[test]
fn test_convert_each_project() {
    let (mut merged, backend) = documents();
    merged.merge(backend);

    let frontend = ThreatModelDocument::from_report(&merged, "frontend").unwrap();
    assert!(frontend.is_valid());
    let model = frontend.model("frontend").unwrap();
    assert_eq!(model.exposes.len(), 1);
    // the shared DFD is part of every project
    assert_eq!(model.sends.len(), 1);

    let backend = ThreatModelDocument::from_report(&merged, "backend").unwrap();
    assert!(backend.is_valid());
    let model = backend.model("backend").unwrap();
    assert_eq!(model.mitigates.len(), 1);
    assert!(model.exposes.is_empty());
    assert_eq!(backend.threat_label("@xss"), Some("Cross-site scripting"));
}

//! Tests for the indexed sample model

use threatspec::model::{ModelSection, Reference, ThreatModelDocument};

use super::fixture_path;

fn sample() -> ThreatModelDocument {
    ThreatModelDocument::load(&fixture_path("sample.json")).expect("sample fixture loads")
}

#[test]
fn test_sample_is_valid() {
    let doc = sample();
    assert!(doc.check().is_empty(), "{:?}", doc.check());
    assert!(doc.is_valid());
}

#[test]
fn test_sample_threat_lookup() {
    let doc = sample();
    let model = doc.model("Project A").unwrap();

    let exposure = &model.exposes[&0];
    assert_eq!(exposure.threat, "@cwe_xxx_yyy");
    assert_eq!(doc.threat_label(&exposure.threat), Some("XXX YYY"));
    assert!(exposure.refs.is_empty());

    let mitigation = &model.mitigates[&0];
    assert_eq!(doc.threat_label(&mitigation.threat), Some("XXX ZZZ"));
}

#[test]
fn test_sample_flows_resolve() {
    let doc = sample();
    let model = doc.model("Project A").unwrap();
    assert_eq!(model.sends.len(), 1);

    let flow = &model.sends[&0];
    assert_eq!(doc.boundary("Project A", flow.srcboundary).unwrap().name, "WebApp");
    assert_eq!(doc.component("Project A", flow.srccomponent).unwrap().name, "App");
    assert_eq!(doc.boundary("Project A", flow.dstboundary).unwrap().name, "User");
    assert_eq!(doc.component("Project A", flow.dstcomponent).unwrap().name, "MailClient");
    assert_eq!(flow.message, "notification email");
}

#[test]
fn test_sample_elements() {
    let doc = sample();
    let model = doc.model("Project A").unwrap();

    let exposure = &model.exposes[&0];
    assert_eq!(exposure.exposure, "insufficient path validation");
    assert_eq!(doc.component("Project A", exposure.component).unwrap().name, "FileSystem");

    let mitigation = &model.mitigates[&0];
    assert_eq!(mitigation.mitigation, "strict file permissions");
    assert_eq!(doc.boundary("Project A", mitigation.boundary).unwrap().name, "WebApp");
}

#[test]
fn test_sample_empty_project() {
    let doc = sample();
    let model = doc.model("Project B").unwrap();
    assert!(model.is_empty());
    assert!(!doc.boundaries.contains_key("Project B"));
    assert!(!doc.components.contains_key("Project B"));
    assert_eq!(doc.projects(), vec!["Project A", "Project B"]);
}

#[test]
fn test_dangling_threat_key() {
    let mut doc = sample();
    doc.threats.remove("@cwe_xxx_yyy");

    let issues = doc.check();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].project, "Project A");
    assert_eq!(issues[0].section, ModelSection::Exposes);
    assert_eq!(issues[0].index, 0);
    assert_eq!(issues[0].reference, Reference::Threat("@cwe_xxx_yyy".to_string()));
}

#[test]
fn test_dangling_component_index() {
    let mut doc = sample();
    doc.components.get_mut("Project A").unwrap().remove(&0);

    // the exposure and the mitigation both point at FileSystem
    let issues = doc.check();
    let sections: Vec<ModelSection> = issues.iter().map(|i| i.section).collect();
    assert_eq!(sections, vec![ModelSection::Exposes, ModelSection::Mitigates]);
    assert!(issues
        .iter()
        .all(|i| matches!(i.reference, Reference::Component { index: 0, .. })));
    assert!(!doc.is_valid());
}

#[test]
fn test_dangling_flow_boundary() {
    let mut doc = sample();
    doc.boundaries.get_mut("Project A").unwrap().remove(&1);

    let issues = doc.check();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].section, ModelSection::Sends);
    assert!(matches!(issues[0].reference, Reference::Boundary { index: 1, .. }));
}

#[test]
fn test_roundtrip_keeps_index_keys() {
    let doc = sample();
    let json: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["models"]["Project A"]["exposes"]["0"]["threat"], "@cwe_xxx_yyy");
    assert_eq!(json["models"]["Project B"], serde_json::json!({}));
    assert_eq!(json["boundaries"]["Project A"]["1"]["name"], "User");
    assert_eq!(json["models"]["Project A"]["sends"]["0"]["message"], "notification email");
}

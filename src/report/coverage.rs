//! Threat coverage summaries

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::ReportDocument;
use crate::domain::{Element, ElementKind};

/// How a threat is handled across all projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    /// Exposed and neither mitigated, transferred nor accepted
    Exposed,
    Mitigated,
    Transferred,
    Accepted,
    /// Only reviewed or not referenced by any element
    Unknown,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Exposed => "exposed",
            CoverageStatus::Mitigated => "mitigated",
            CoverageStatus::Transferred => "transferred",
            CoverageStatus::Accepted => "accepted",
            CoverageStatus::Unknown => "unknown",
        }
    }
}

/// Element counts for one threat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreatCoverage {
    pub id: String,
    pub name: String,
    pub mitigations: usize,
    pub exposures: usize,
    pub transfers: usize,
    pub acceptances: usize,
}

impl ThreatCoverage {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            mitigations: 0,
            exposures: 0,
            transfers: 0,
            acceptances: 0,
        }
    }

    pub fn status(&self) -> CoverageStatus {
        if self.mitigations > 0 {
            CoverageStatus::Mitigated
        } else if self.transfers > 0 {
            CoverageStatus::Transferred
        } else if self.acceptances > 0 {
            CoverageStatus::Accepted
        } else if self.exposures > 0 {
            CoverageStatus::Exposed
        } else {
            CoverageStatus::Unknown
        }
    }
}

/// One line of the threat hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatNode {
    pub id: String,
    /// Empty for parents missing from the catalog
    pub name: String,
    pub depth: usize,
}

impl ReportDocument {
    /// Coverage of every threat referenced by a project element, sorted by id
    ///
    /// Catalog threats no element refers to are left out.
    pub fn coverage(&self) -> Vec<ThreatCoverage> {
        let mut by_threat: BTreeMap<&str, ThreatCoverage> = BTreeMap::new();

        for project in self.projects.values() {
            for element in project.elements() {
                let Some(threat) = element.threat() else {
                    continue;
                };
                let entry = by_threat.entry(threat).or_insert_with(|| {
                    let name = self.threats.get(threat).map_or(threat, |t| t.name.as_str());
                    ThreatCoverage::new(threat, name)
                });
                match element.kind() {
                    ElementKind::Mitigation => entry.mitigations += 1,
                    ElementKind::Exposure => entry.exposures += 1,
                    ElementKind::Transfer => entry.transfers += 1,
                    ElementKind::Acceptance => entry.acceptances += 1,
                    ElementKind::Review => {}
                }
            }
        }

        by_threat.into_values().collect()
    }

    /// Threat hierarchy from `parent` links: parent id -> child ids
    ///
    /// Threats without a parent are children of the empty string.
    pub fn threat_tree(&self) -> BTreeMap<String, Vec<String>> {
        let mut tree: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (id, threat) in &self.threats {
            tree.entry(threat.parent.clone().unwrap_or_default())
                .or_default()
                .push(id.clone());
        }
        tree
    }

    /// Depth-first listing of the threat hierarchy
    ///
    /// Every threat appears exactly once. Parents that are not catalog
    /// threats are listed as roots, and threats caught in a `parent` cycle
    /// are listed from the lowest id of the cycle.
    pub fn threat_outline(&self) -> Vec<ThreatNode> {
        let tree = self.threat_tree();
        let mut roots: Vec<&str> = tree.get("").map_or_else(Vec::new, |c| {
            c.iter().map(String::as_str).collect()
        });
        roots.extend(
            tree.keys()
                .map(String::as_str)
                .filter(|p| !p.is_empty() && !self.threats.contains_key(*p)),
        );
        roots.sort_unstable();

        let mut visited = BTreeSet::new();
        let mut outline = Vec::new();
        for root in roots {
            self.walk_tree(&tree, root, 0, &mut visited, &mut outline);
        }
        for id in self.threats.keys() {
            self.walk_tree(&tree, id, 0, &mut visited, &mut outline);
        }
        outline
    }

    fn walk_tree(
        &self,
        tree: &BTreeMap<String, Vec<String>>,
        id: &str,
        depth: usize,
        visited: &mut BTreeSet<String>,
        outline: &mut Vec<ThreatNode>,
    ) {
        if !visited.insert(id.to_string()) {
            return;
        }
        outline.push(ThreatNode {
            id: id.to_string(),
            name: self.threats.get(id).map_or_else(String::new, |t| t.name.clone()),
            depth,
        });
        for child in tree.get(id).into_iter().flatten() {
            self.walk_tree(tree, child, depth + 1, visited, outline);
        }
    }
}

//! Threat libraries built from the CWE catalogue
//!
//! The MITRE CWE XML is turned into a document that only carries `threats`,
//! ready to be preloaded with `parse --library`:
//!
//! ```json
//! "@cwe_79_improper_neutralization_of_input_during_web_page_generation": {
//!   "name": "Improper Neutralization of Input During Web Page Generation",
//!   "description": "...",
//!   "references": ["CWE 79", "https://cwe.mitre.org/data/definitions/79.html"],
//!   "parent": "@cross_site_scripting"
//! }
//! ```
//!
//! With the Software Fault Pattern view, weaknesses hang below their SFP
//! category, and top level categories below `@sfp`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node};
use tracing::debug;

use crate::domain::Threat;
use crate::registry::current_millis;
use crate::report::{DocumentInfo, ReportDocument};

/// Name of the CWE view holding the SFP clusters
pub const SFP_VIEW_NAME: &str = "Software Fault Pattern (SFP) Clusters";

/// Parent of the top level SFP categories
pub const SFP_ROOT: &str = "@sfp";

const NO_DESCRIPTION: &str = "No description available.";

static ID_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_ \-]").expect("id pattern is valid"));
static ID_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \-]").expect("separator pattern is valid"));
static TEXT_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_ \-;:.,]").expect("text pattern is valid"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("space pattern is valid"));

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid CWE XML: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("Not a CWE catalogue: missing <{0}>")]
    MissingElement(&'static str),

    #[error("The catalogue has no Software Fault Pattern (SFP) Clusters view")]
    MissingSfpView,
}

/// A `<Relationship>` of a view, category or weakness
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationship {
    pub target_form: String,
    pub nature: String,
    pub target_id: String,
    /// Views the relationship belongs to
    pub views: Vec<String>,
}

/// A weakness, category or view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CweEntry {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub relationships: Vec<Relationship>,
}

impl CweEntry {
    /// `CWE <id>` and the definition URL
    pub fn references(&self) -> Vec<String> {
        vec![
            format!("CWE {}", self.id),
            format!("https://cwe.mitre.org/data/definitions/{}.html", self.id),
        ]
    }

    fn threat(&self, name: &str, parent: Option<String>) -> Threat {
        let mut threat = Threat::new(name)
            .with_description(self.description.as_deref().unwrap_or(NO_DESCRIPTION));
        threat.references = self.references();
        threat.parent = parent;
        threat
    }
}

/// Lowercase, underscore separated form of a CWE name
fn slug(name: &str) -> String {
    let cleaned = ID_UNSAFE.replace_all(name, "");
    ID_SEPARATOR.replace_all(&cleaned, "_").to_lowercase()
}

/// Threat identifier of a weakness: `@cwe_<id>_<name>`
pub fn weakness_id(id: &str, name: &str) -> String {
    format!("@cwe_{}_{}", id, slug(name))
}

/// Category name without its cluster prefix (`SFP Secondary Cluster: Faulty Buffer Access`)
pub fn category_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, rest)| rest.trim())
}

/// Threat identifier of a category
pub fn category_id(name: &str) -> String {
    format!("@{}", slug(category_name(name)))
}

fn clean_text(text: &str) -> String {
    let cleaned = TEXT_UNSAFE.replace_all(text, " ");
    SPACES.replace_all(&cleaned, " ").trim().to_string()
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// All text below a node, structured (XHTML) descriptions included
fn text_of(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn child_text(node: Node, name: &str) -> String {
    child(node, name).map(text_of).unwrap_or_default().trim().to_string()
}

fn parse_relationships(node: Node) -> Vec<Relationship> {
    let Some(list) = child(node, "Relationships") else {
        return Vec::new();
    };
    children(list, "Relationship")
        .map(|r| Relationship {
            target_form: child_text(r, "Relationship_Target_Form"),
            nature: child_text(r, "Relationship_Nature"),
            target_id: child_text(r, "Relationship_Target_ID"),
            views: child(r, "Relationship_Views")
                .map(|views| {
                    children(views, "Relationship_View_ID")
                        .map(|v| text_of(v).trim().to_string())
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

/// Summary followed by the extended description texts joined with `.`
///
/// Older catalogues nest `Description_Summary` and `Extended_Description`
/// below `Description`, newer ones put the summary text in `Description`
/// and `Extended_Description` next to it.
fn parse_description(node: Node) -> Option<String> {
    let description = child(node, "Description")?;
    let summary = match child(description, "Description_Summary") {
        Some(summary) => text_of(summary),
        None => text_of(description),
    };

    let extended = child(description, "Extended_Description")
        .or_else(|| child(node, "Extended_Description"))
        .map(|ext| {
            let texts: Vec<String> = children(ext, "Text").map(text_of).collect();
            if texts.is_empty() {
                text_of(ext)
            } else {
                texts.join(".")
            }
        })
        .map(|ext| clean_text(&ext))
        .filter(|ext| !ext.is_empty());

    let summary = clean_text(&summary);
    Some(match extended {
        Some(ext) => format!("{} {}", summary, ext),
        None => summary,
    })
}

fn parse_entry(node: Node) -> CweEntry {
    CweEntry {
        id: node.attribute("ID").unwrap_or_default().to_string(),
        name: node.attribute("Name").unwrap_or_default().to_string(),
        description: parse_description(node),
        relationships: parse_relationships(node),
    }
}

/// Weaknesses, categories and views of a CWE catalogue
#[derive(Debug, Clone, Default)]
pub struct CweCatalog {
    pub weaknesses: Vec<CweEntry>,
    pub categories: Vec<CweEntry>,
    pub views: Vec<CweEntry>,
}

impl CweCatalog {
    /// Parse the XML of a `<Weakness_Catalog>`
    pub fn parse(xml: &str) -> Result<Self, CatalogError> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();
        if root.tag_name().name() != "Weakness_Catalog" {
            return Err(CatalogError::MissingElement("Weakness_Catalog"));
        }

        let section = |list: &str, item: &'static str| -> Vec<CweEntry> {
            child(root, list)
                .map(|l| children(l, item).map(parse_entry).collect())
                .unwrap_or_default()
        };

        let catalog = Self {
            weaknesses: section("Weaknesses", "Weakness"),
            categories: section("Categories", "Category"),
            views: section("Views", "View"),
        };
        if catalog.weaknesses.is_empty() {
            return Err(CatalogError::MissingElement("Weaknesses"));
        }
        debug!(
            "Parsed CWE catalogue: {} weaknesses, {} categories, {} views",
            catalog.weaknesses.len(),
            catalog.categories.len(),
            catalog.views.len()
        );
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Every weakness as a threat, without hierarchy
    pub fn threats(&self) -> BTreeMap<String, Threat> {
        self.weaknesses
            .iter()
            .map(|w| (weakness_id(&w.id, &w.name), w.threat(&w.name, None)))
            .collect()
    }

    /// SFP categories and the weaknesses belonging to them, linked by `parent`
    ///
    /// Weaknesses outside the SFP clusters are left out.
    pub fn sfp_threats(&self) -> Result<BTreeMap<String, Threat>, CatalogError> {
        let view = self
            .views
            .iter()
            .find(|v| v.name == SFP_VIEW_NAME)
            .ok_or(CatalogError::MissingSfpView)?;

        let top_level: BTreeSet<&str> = view
            .relationships
            .iter()
            .filter(|r| r.target_form == "Category" && r.nature == "HasMember")
            .map(|r| r.target_id.as_str())
            .collect();

        let category_ids: BTreeMap<&str, String> = self
            .categories
            .iter()
            .map(|c| (c.id.as_str(), category_id(&c.name)))
            .collect();

        let mut threats = BTreeMap::new();
        // CWE category id -> threat identifier
        let mut sfp_categories: BTreeMap<&str, String> = BTreeMap::new();

        for category in &self.categories {
            if !top_level.contains(category.id.as_str()) {
                continue;
            }
            let id = category_ids[category.id.as_str()].clone();
            threats.insert(
                id.clone(),
                category.threat(category_name(&category.name), Some(SFP_ROOT.to_string())),
            );
            sfp_categories.insert(&category.id, id);
        }

        for category in &self.categories {
            let parent = category
                .relationships
                .iter()
                .filter(|r| r.views.iter().any(|v| *v == view.id))
                .find_map(|r| category_ids.get(r.target_id.as_str()));
            let Some(parent) = parent else {
                continue;
            };
            let id = category_ids[category.id.as_str()].clone();
            threats.insert(
                id.clone(),
                category.threat(category_name(&category.name), Some(parent.clone())),
            );
            sfp_categories.insert(&category.id, id);
        }

        for weakness in &self.weaknesses {
            let parent = weakness
                .relationships
                .iter()
                .filter(|r| r.target_form == "Category" && r.nature == "ChildOf")
                .find_map(|r| sfp_categories.get(r.target_id.as_str()));
            let Some(parent) = parent else {
                continue;
            };
            threats.insert(
                weakness_id(&weakness.id, &weakness.name),
                weakness.threat(&weakness.name, Some(parent.clone())),
            );
        }

        debug!("Built SFP library with {} threats", threats.len());
        Ok(threats)
    }
}

/// A document carrying nothing but a threat catalogue
pub fn library(threats: BTreeMap<String, Threat>) -> ReportDocument {
    let now = current_millis();
    ReportDocument {
        document: DocumentInfo {
            created: now,
            updated: now,
        },
        threats,
        ..Default::default()
    }
}

//! Data flow diagram built from `@connects` tags
//!
//! Edges are stored as a nested tree:
//! source boundary -> source component -> destination boundary -> destination component -> edge

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{text_to_identifier, SourceMeta};

/// Direction of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// `@connects a to b`
    Uni,
    /// `@connects a with b`
    Bi,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Uni => "uni",
            ConnectionType::Bi => "bi",
        }
    }
}

/// Details stored on each DFD edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfdEdge {
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,

    /// Optional label (`@connects ... as https`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub source: SourceMeta,
}

/// A fully qualified connection between two components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source_boundary: String,
    pub source_component: String,
    pub dest_boundary: String,
    pub dest_component: String,
    pub edge: DfdEdge,
}

impl Connection {
    /// Create a connection, normalising all endpoints to identifiers
    pub fn new(
        source_boundary: &str,
        source_component: &str,
        dest_boundary: &str,
        dest_component: &str,
        connection_type: ConnectionType,
        source: SourceMeta,
    ) -> Self {
        Self {
            source_boundary: text_to_identifier(source_boundary),
            source_component: text_to_identifier(source_component),
            dest_boundary: text_to_identifier(dest_boundary),
            dest_component: text_to_identifier(dest_component),
            edge: DfdEdge {
                connection_type,
                name: None,
                source,
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.edge.name = Some(name.into());
        self
    }
}

type DestComponents = BTreeMap<String, DfdEdge>;
type DestBoundaries = BTreeMap<String, DestComponents>;
type SourceComponents = BTreeMap<String, DestBoundaries>;

/// The data flow diagram tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dfd {
    pub tree: BTreeMap<String, SourceComponents>,
}

impl Dfd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge to the tree
    ///
    /// The first edge recorded for a given pair of endpoints is kept.
    /// Returns false when the edge already existed.
    pub fn add_edge(&mut self, connection: Connection) -> bool {
        let dest = self
            .tree
            .entry(connection.source_boundary)
            .or_default()
            .entry(connection.source_component)
            .or_default()
            .entry(connection.dest_boundary)
            .or_default();

        if dest.contains_key(&connection.dest_component) {
            return false;
        }
        dest.insert(connection.dest_component, connection.edge);
        true
    }

    /// Look up the edge between two endpoints
    pub fn edge(
        &self,
        source_boundary: &str,
        source_component: &str,
        dest_boundary: &str,
        dest_component: &str,
    ) -> Option<&DfdEdge> {
        self.tree
            .get(source_boundary)?
            .get(source_component)?
            .get(dest_boundary)?
            .get(dest_component)
    }

    /// Flatten the tree into connections (in sorted endpoint order)
    pub fn connections(&self) -> Vec<Connection> {
        let mut out = Vec::new();
        for (sb, components) in &self.tree {
            for (sc, dest_boundaries) in components {
                for (db, dest_components) in dest_boundaries {
                    for (dc, edge) in dest_components {
                        out.push(Connection {
                            source_boundary: sb.clone(),
                            source_component: sc.clone(),
                            dest_boundary: db.clone(),
                            dest_component: dc.clone(),
                            edge: edge.clone(),
                        });
                    }
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Merge another diagram into this one, keeping existing edges
    pub fn merge(&mut self, other: Dfd) {
        for connection in other.connections() {
            self.add_edge(connection);
        }
    }
}

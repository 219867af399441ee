use serde::{Deserialize, Serialize};

/// A named entry of the threat model (boundary, component or threat)
///
/// In the intermediate document these are grouped together and can be
/// shared between source files or even projects:
///
/// ```json
/// "boundaries": {
///     "@auth": { "name": "Authentication / EC2" },
///     "@external": { "name": "External" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// External references (CWE ids, URLs); used by threat libraries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,

    /// Parent threat identifier, for hierarchical threat libraries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A trust boundary
pub type Boundary = Property;

/// A component living inside a trust boundary
pub type Component = Property;

/// A threat against the system
pub type Threat = Property;

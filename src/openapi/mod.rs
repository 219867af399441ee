//! Tag extraction from OpenAPI documents
//!
//! Tags are written as extension fields anywhere in the document:
//!
//! ```yaml
//! paths:
//!   /users:
//!     get:
//!       x-threatspec-mitigates: "@api:@users against @info_disclosure with authentication"
//!       x-threatspec-exposes:
//!         - "@api:@users to @enumeration with sequential ids"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::comment::{CommentParser, TagComment};
use crate::domain::SourceMeta;

/// Prefix of extension keys holding tags
pub const EXTENSION_PREFIX: &str = "x-threatspec";

/// Walks OpenAPI documents for `x-threatspec-*` fields
#[derive(Default)]
pub struct OpenApiExtractor {
    parser: CommentParser,
}

impl OpenApiExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML or JSON file and extract its tags
    pub fn load_file(&self, path: &Path) -> Result<Vec<TagComment>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        // JSON is a subset of YAML
        let value: Value = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse OpenAPI document: {}", path.display()))?;
        let tags = self.extract(&value, &path.display().to_string());
        debug!("Found {} tags in {}", tags.len(), path.display());
        Ok(tags)
    }

    /// Extract all tags from a parsed document
    ///
    /// The source of each tag records the file and the JSON pointer of the
    /// object holding the extension field.
    pub fn extract(&self, value: &Value, source_file: &str) -> Vec<TagComment> {
        let mut tags = Vec::new();
        self.walk(value, source_file, "", &mut tags);
        tags
    }

    fn walk(&self, value: &Value, file: &str, pointer: &str, tags: &mut Vec<TagComment>) {
        match value {
            Value::Mapping(map) => {
                for (key, child) in map {
                    let Some(key) = key.as_str() else {
                        continue;
                    };
                    if let Some(suffix) = key.strip_prefix(EXTENSION_PREFIX) {
                        self.field(suffix.trim_start_matches('-'), child, file, pointer, tags);
                    } else {
                        let escaped = key.replace('~', "~0").replace('/', "~1");
                        self.walk(child, file, &format!("{}/{}", pointer, escaped), tags);
                    }
                }
            }
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.walk(item, file, &format!("{}/{}", pointer, i), tags);
                }
            }
            Value::Tagged(tagged) => self.walk(&tagged.value, file, pointer, tags),
            _ => {}
        }
    }

    fn field(&self, tag: &str, value: &Value, file: &str, pointer: &str, tags: &mut Vec<TagComment>) {
        let text = match value {
            Value::Sequence(items) => {
                for item in items {
                    self.field(tag, item, file, pointer, tags);
                }
                return;
            }
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                warn!("Ignoring non-scalar {}-{} field at {}#{}", EXTENSION_PREFIX, tag, file, pointer);
                return;
            }
        };

        let source = SourceMeta::new(file, 0, pointer);
        match self.parser.parse_text(&format!("@{} {}", tag, text), source) {
            Some(parsed) => tags.push(parsed),
            None => warn!("Unknown tag {}-{} at {}#{}", EXTENSION_PREFIX, tag, file, pointer),
        }
    }
}

//! Comment parsing for threatspec tags
//!
//! A tag is a line whose content (after an optional comment marker) starts with
//! one of the known tags:
//!
//! - `// @mitigates @web:@app against XSS with output encoding`
//! - `# @alias boundary @web to Web Application`
//! - ` * @connects @user:@browser to @web:@app as https`
//!
//! A line ending with `\` continues on the next line, so long tags can be
//! wrapped inside block comments and docstrings.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{remove_excessive_space, SourceMeta};

/// Comment markers stripped before looking for a tag
pub const DEFAULT_MARKERS: &[&str] = &["//", "/*", "*", "#", "--", "\"\"\"", "'''"];

/// Function name recorded for tags found by the line scanner
pub const UNIVERSAL_FUNCTION: &str = "universal";

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^@(alias|describe|connects|review|mitigates|exposes|transfers|accepts)\b")
        .expect("tag pattern is valid")
});

/// The known threatspec tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Alias,
    Describe,
    Connects,
    Review,
    Mitigates,
    Exposes,
    Transfers,
    Accepts,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Alias => "alias",
            TagKind::Describe => "describe",
            TagKind::Connects => "connects",
            TagKind::Review => "review",
            TagKind::Mitigates => "mitigates",
            TagKind::Exposes => "exposes",
            TagKind::Transfers => "transfers",
            TagKind::Accepts => "accepts",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "alias" => Some(TagKind::Alias),
            "describe" => Some(TagKind::Describe),
            "connects" => Some(TagKind::Connects),
            "review" => Some(TagKind::Review),
            "mitigates" => Some(TagKind::Mitigates),
            "exposes" => Some(TagKind::Exposes),
            "transfers" => Some(TagKind::Transfers),
            "accepts" => Some(TagKind::Accepts),
            _ => None,
        }
    }

    /// Position when applying a batch of tags: aliases first, descriptions last
    pub fn apply_order(&self) -> u8 {
        match self {
            TagKind::Alias => 0,
            TagKind::Describe => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

/// A tag found in a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagComment {
    pub kind: TagKind,
    /// The whole tag text, starting with the `@tag` itself, whitespace normalised
    pub text: String,
    pub source: SourceMeta,
}

/// Parser for threatspec tags in arbitrary source files
pub struct CommentParser {
    /// Comment markers, longest first so `///` is not mistaken for `/`
    markers: Vec<String>,
}

impl CommentParser {
    /// Create a parser with the default comment markers
    pub fn new() -> Self {
        let markers: Vec<String> = DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect();
        Self::with_markers(&markers)
    }

    /// Create a parser with custom comment markers
    pub fn with_markers(markers: &[String]) -> Self {
        let mut markers: Vec<String> = markers
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        markers.sort_by(|a, b| b.len().cmp(&a.len()));
        markers.dedup();
        Self { markers }
    }

    /// Strip leading whitespace and comment markers
    fn strip_markers<'a>(&self, line: &'a str) -> &'a str {
        let mut rest = line.trim();
        loop {
            let before = rest.len();
            for marker in &self.markers {
                if let Some(stripped) = rest.strip_prefix(marker.as_str()) {
                    rest = stripped.trim_start();
                    break;
                }
            }
            if rest.len() == before {
                break;
            }
        }
        rest
    }

    /// Remove a trailing block comment close (`*/`)
    fn strip_trailing_close(text: &str) -> &str {
        text.trim_end()
            .strip_suffix("*/")
            .map(str::trim_end)
            .unwrap_or_else(|| text.trim_end())
    }

    /// Parse a single tag string (no comment markers) attributed to `source`
    pub fn parse_text(&self, text: &str, source: SourceMeta) -> Option<TagComment> {
        let content = self.strip_markers(text);
        let captures = TAG_PATTERN.captures(content)?;
        let kind = TagKind::from_str(captures.get(1)?.as_str())?;

        Some(TagComment {
            kind,
            text: remove_excessive_space(Self::strip_trailing_close(content)),
            source,
        })
    }

    /// Parse a single line for a tag
    pub fn parse_line(&self, path: &Path, line_number: usize, line: &str) -> Option<TagComment> {
        let source = SourceMeta::new(path.display().to_string(), line_number, UNIVERSAL_FUNCTION);
        self.parse_text(line, source)
    }

    /// Parse a file and extract all tags
    ///
    /// Continuation lines (ending with `\`) are joined onto the tag line;
    /// the tag is attributed to the line it starts on.
    pub fn parse_file(&self, path: &Path, content: &str) -> Vec<TagComment> {
        let mut tags = Vec::new();
        let lines: Vec<&str> = content.lines().collect();
        let mut idx = 0;

        while idx < lines.len() {
            let line_number = idx + 1; // 1-indexed
            let mut text = Self::strip_trailing_close(self.strip_markers(lines[idx])).to_string();
            idx += 1;

            if !TAG_PATTERN.is_match(&text) {
                continue;
            }

            while let Some(stripped) = text.strip_suffix('\\') {
                text = stripped.trim_end().to_string();
                let Some(next) = lines.get(idx) else {
                    break;
                };
                let continuation = Self::strip_trailing_close(self.strip_markers(next));
                text.push(' ');
                text.push_str(continuation);
                idx += 1;
            }

            if let Some(tag) = self.parse_line(path, line_number, &text) {
                tags.push(tag);
            }
        }

        tags
    }
}

impl Default for CommentParser {
    fn default() -> Self {
        Self::new()
    }
}

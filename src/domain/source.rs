use serde::{Deserialize, Serialize};

/// Where a tag was found in the source tree
///
/// Captured for every tag so reports can point back at the exact
/// file and line that declared a mitigation, exposure, etc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMeta {
    /// File name as given on the command line (or found by the scanner)
    pub file: String,

    /// Line number (1-indexed, 0 when unknown)
    pub line: usize,

    /// Enclosing function, class or parser name
    pub function: String,
}

impl SourceMeta {
    pub fn new(file: impl Into<String>, line: usize, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

impl std::fmt::Display for SourceMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.file, self.line)
    }
}

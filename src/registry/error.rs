use crate::comment::TagKind;
use crate::domain::SourceMeta;

/// Error type for applying tags to the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("{tag} line contains an invalid pattern: {location}")]
    InvalidPattern { tag: TagKind, location: SourceMeta },

    #[error("{class} identifier was given, but {class} '{name}' is already an identifier")]
    IdentifierConflict { class: &'static str, name: String },

    #[error("{class} '{name}' has no letters or digits to build an identifier from")]
    EmptyIdentifier { class: &'static str, name: String },

    #[error("unknown boundary identifier {id} in {location}")]
    UnknownBoundary { id: String, location: SourceMeta },

    #[error("unknown {class} identifier {id} in {location}")]
    UnknownEntry {
        class: &'static str,
        id: String,
        location: SourceMeta,
    },
}

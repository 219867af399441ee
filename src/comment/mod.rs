//! Comment parsing for threatspec tags
//!
//! Works in any comment style: //, #, /* */, --, docstrings, etc.

mod parser;

pub use parser::{CommentParser, TagComment, TagKind, DEFAULT_MARKERS, UNIVERSAL_FUNCTION};

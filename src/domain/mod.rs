//! Core domain types for threatspec

mod dfd;
mod element;
mod identifier;
mod property;
mod source;

pub use dfd::{Connection, ConnectionType, Dfd, DfdEdge};
pub use element::{Acceptance, Element, ElementKind, Exposure, Mitigation, Review, Transfer};
pub use identifier::{
    is_empty_identifier, is_identifier, remove_excessive_space, text_to_identifier,
};
pub use property::{Boundary, Component, Property, Threat};
pub use source::SourceMeta;

//! threatspec - threat modeling as code
//!
//! Threats, mitigations and data flows are written as tags in source
//! comments next to the code they describe. threatspec collects them into a
//! threat model that can be merged, validated and reported on.
//!
//! ## Pipeline
//!
//! 1. **Scan**: the [`scanner`] walks a source tree and the [`comment`] parser
//!    picks out tag lines (`@mitigates`, `@exposes`, `@connects`, ...).
//!    OpenAPI documents carry the same tags as `x-threatspec-*` fields
//!    ([`openapi`]).
//! 2. **Register**: the [`registry`] applies tags, naming boundaries,
//!    components and threats and recording project elements.
//! 3. **Export**: the [`report`] module writes the intermediate JSON document,
//!    which the [`validate`] module checks against its schema.
//! 4. **Convert**: the [`model`] module turns a project into the compact
//!    indexed threat model and checks its cross references.
//!
//! Threat libraries generated from the CWE catalogue ([`catalog`]) can be
//! preloaded so tags refer to well known threats.

pub mod catalog;
pub mod comment;
pub mod config;
pub mod domain;
pub mod model;
pub mod openapi;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod validate;

pub use domain::*;

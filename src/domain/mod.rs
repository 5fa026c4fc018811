//! Domain models for sfcpack
//!
//! Contains the core component logic without any I/O concerns.

pub mod naming;
mod artifact;
mod scope_id;
mod sfc;
mod graph;

pub use artifact::{
    name_for, rewrite_imports, style_import_specifier, ArtifactKind, COMPILED_STYLE_EXT,
};
pub use scope_id::{scope_id, ScopeId};
pub use sfc::{
    component_name, BlockParser, ComponentUnit, ParseError, ParseFailure, ParsedSfc, ScriptBlock,
    SfcParser, StyleBlock, TemplateBlock,
};
pub use graph::{sequence, DependencyGraph, GraphError};

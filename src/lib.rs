//! sfcpack - a build pipeline for single-file component libraries
//!
//! Splits every component unit into standalone script and style files,
//! assigns scope ids to scoped styles, orders components by style
//! dependency, and generates the library's entry module and aggregated
//! stylesheet.

pub mod cli;
pub mod codegen;
pub mod compiler;
pub mod domain;
pub mod storage;

pub use codegen::{generate_entry, generate_style, EntryOptions, StyleOptions};
pub use compiler::{build, BuildReport, Decomposer, Toolchain};
pub use domain::{name_for, scope_id, sequence, ArtifactKind, DependencyGraph, ScopeId};

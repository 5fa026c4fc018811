//! # Package Code Generation
//!
//! Synthesizes the two library-level modules from the sequenced component
//! list:
//!
//! | Module | Generator | Output |
//! |--------|-----------|--------|
//! | Entry | [`generate_entry`] | JS module importing, installing and re-exporting every component |
//! | Style | [`generate_style`] | Stylesheet `@import`ing the base style and every component style |
//!
//! Both are pure text synthesis: no I/O, no shared state. The style
//! generator's existence check is injected by the caller.

mod entry;
mod style;

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

pub use entry::{generate_entry, EntryOptions};
pub use style::{generate_style, GeneratedStyle, StyleOptions};

/// Rewrites a resolved module path (e.g., to make it relative to the output)
pub type PathResolver = Box<dyn Fn(&Path) -> PathBuf + Send + Sync>;

#[derive(Debug, Error, PartialEq)]
pub enum CodegenError {
    #[error("Components '{first}' and '{second}' both map to identifier '{binding}'")]
    DuplicateBinding {
        binding: String,
        first: String,
        second: String,
    },

    #[error("Component '{name}' maps to invalid identifier '{binding}'")]
    InvalidIdentifier { name: String, binding: String },
}

/// Applies the optional resolver to `path`
fn resolve(path: PathBuf, resolver: Option<&PathResolver>) -> PathBuf {
    match resolver {
        Some(resolver) => resolver(&path),
        None => path,
    }
}

/// Resolver producing `./`-relative module paths as seen from `base`
pub fn relative_resolver(base: &Path) -> PathResolver {
    let base = base.to_path_buf();
    Box::new(move |path: &Path| relative_path(&base, path))
}

fn relative_path(base: &Path, path: &Path) -> PathBuf {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = path.components().collect();
    let common = base
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    if common == base.len() {
        out.push(".");
    }
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component);
    }
    out
}

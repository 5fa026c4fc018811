//! Package stylesheet generation
//!
//! Emits the base stylesheet import (if any) followed by one import per
//! component, in exactly the sequenced order. Cascade order in consuming
//! applications depends on this order.

use std::path::{Path, PathBuf};

use super::{resolve, PathResolver};
use crate::domain::naming::{css_string, normalize_path};

/// File stems checked, in order, for a component's stylesheet
const STYLE_ENTRY_STEMS: &[&str] = &["index", "index-sfc"];

/// Options for [`generate_style`]
#[derive(Default)]
pub struct StyleOptions {
    /// Base/reset stylesheet imported first
    pub base: Option<PathBuf>,
    /// Style language extension (`css`, `less`, `scss`)
    pub lang: String,
    /// Directory holding one directory per component
    pub src_dir: PathBuf,
    /// Rewrites every imported path
    pub path_resolver: Option<PathResolver>,
}

/// Result of [`generate_style`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStyle {
    /// Stylesheet text
    pub source: String,
    /// Components skipped because no stylesheet exists
    pub missing: Vec<String>,
}

/// Generates the aggregated stylesheet for `names`
///
/// `exists` decides whether a candidate stylesheet is present.
pub fn generate_style(
    names: &[String],
    options: &StyleOptions,
    exists: impl Fn(&Path) -> bool,
) -> GeneratedStyle {
    let mut lines = Vec::with_capacity(names.len() + 1);
    let mut missing = Vec::new();

    if let Some(base) = &options.base {
        lines.push(import_line(base.clone(), options));
    }

    for name in names {
        let found = STYLE_ENTRY_STEMS
            .iter()
            .map(|stem| {
                options
                    .src_dir
                    .join(name)
                    .join(format!("{}.{}", stem, options.lang))
            })
            .find(|path| exists(path.as_path()));

        match found {
            Some(path) => lines.push(import_line(path, options)),
            None => missing.push(name.clone()),
        }
    }

    let mut source = lines.join("\n");
    if !source.is_empty() {
        source.push('\n');
    }

    GeneratedStyle { source, missing }
}

fn import_line(path: PathBuf, options: &StyleOptions) -> String {
    let path = resolve(path, options.path_resolver.as_ref());
    format!("@import \"{}\";", css_string(&normalize_path(&path)))
}

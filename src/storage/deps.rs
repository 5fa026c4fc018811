//! Style dependency map
//!
//! Builds the [`DependencyGraph`] by statically scanning each component's
//! files for imports that land in another component's directory, and
//! persists it together with the computed sequence as `style-deps.json`.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::output::{write_if_changed, EXCLUDED_DIRS};
use crate::domain::naming::lexical_normalize;
use crate::domain::DependencyGraph;

/// File name of the persisted map, inside the output directory
pub const STYLE_DEPS_FILE: &str = "style-deps.json";

/// Extensions whose imports are followed
const SCANNED_EXTENSIONS: &[&str] = &["vue", "js", "jsx", "ts", "tsx", "css", "less", "scss"];

lazy_static! {
    // import x from '..' | import '..' | export * from '..' | @import '..' | require('..')
    static ref IMPORT_RE: Regex = Regex::new(
        r#"(?:\bimport|\bexport)\s+(?:[^'";]*?\bfrom\s+)?['"]([^'"\n]+)['"]|\brequire\(\s*['"]([^'"\n]+)['"]\s*\)"#
    )
    .unwrap();
}

/// Persisted form of the dependency map and its sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDeps {
    pub map: DependencyGraph,
    pub sequence: Vec<String>,
}

impl StyleDeps {
    /// Reads `style-deps.json` from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(STYLE_DEPS_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Writes `style-deps.json` into `dir`; returns true if it changed
    pub fn save(&self, dir: &Path) -> Result<bool> {
        let mut json = serde_json::to_string_pretty(self).context("Failed to serialize style deps")?;
        json.push('\n');
        write_if_changed(&dir.join(STYLE_DEPS_FILE), &json)
    }
}

/// Scans the components under `src_dir` and returns their dependency graph
///
/// Every name gets an entry. Only relative specifiers are followed; package
/// imports never create edges.
pub fn scan(src_dir: &Path, names: &[String]) -> Result<DependencyGraph> {
    let known: HashSet<&str> = names.iter().map(String::as_str).collect();

    let edges = names
        .par_iter()
        .map(|name| {
            let deps = scan_component(src_dir, name, &known)?;
            Ok((name, deps))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut graph = DependencyGraph::new();
    for (name, deps) in edges {
        graph.add_component(name.clone());
        for dep in deps {
            graph.add_dependency(name.clone(), dep);
        }
    }
    Ok(graph)
}

fn scan_component(src_dir: &Path, name: &str, known: &HashSet<&str>) -> Result<Vec<String>> {
    let component_dir = src_dir.join(name);
    let mut deps = Vec::new();

    let walker = WalkDir::new(&component_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && EXCLUDED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()))
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", component_dir.display()))?;
        if !entry.file_type().is_file() || !is_scanned(entry.path()) {
            continue;
        }

        let content = fs::read_to_string(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        let from_dir = entry.path().parent().unwrap_or(&component_dir);

        for specifier in import_specifiers(&content) {
            if let Some(dep) = target_component(src_dir, from_dir, specifier) {
                if dep != name && known.contains(dep.as_str()) && !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
    }

    Ok(deps)
}

fn is_scanned(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCANNED_EXTENSIONS.contains(&ext))
}

/// Every module specifier imported by `source`
fn import_specifiers(source: &str) -> impl Iterator<Item = &str> {
    IMPORT_RE.captures_iter(source).filter_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
    })
}

/// The component directory a relative specifier resolves into, if any
fn target_component(src_dir: &Path, from_dir: &Path, specifier: &str) -> Option<String> {
    if !specifier.starts_with('.') {
        return None;
    }

    let resolved = lexical_normalize(&from_dir.join(specifier));
    let relative = resolved.strip_prefix(lexical_normalize(src_dir)).ok()?;

    match relative.components().next()? {
        Component::Normal(first) => Some(first.to_string_lossy().into_owned()),
        _ => None,
    }
}

//! Full library build
//!
//! One build rebuilds the output tree from scratch. Units are decomposed in
//! parallel and a failing unit never stops the others; its error lands in
//! [`BuildReport::failures`]. Dependency and codegen errors abort the build.
//! Sequencing reads only the source tree and runs first, so a dependency
//! cycle leaves the previous output in place.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use super::{Decomposed, Decomposer};
use crate::codegen::{generate_entry, generate_style, relative_resolver, EntryOptions, StyleOptions};
use crate::domain::naming::pascalize;
use crate::domain::{rewrite_imports, sequence};
use crate::storage::deps::{self, StyleDeps};
use crate::storage::output::{clean_dir, copy_tree, write_if_changed};
use crate::storage::{discover_components, Project};

/// Name of the generated entry module inside the output directory
pub const ENTRY_FILE: &str = "index.js";

const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];
const STYLE_EXTENSIONS: &[&str] = &["css", "less", "scss"];

/// A unit or file that could not be built
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub path: PathBuf,
    pub message: String,
}

/// What a build did
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub version: String,
    /// Files copied from the source tree
    pub copied: usize,
    pub units: Vec<Decomposed>,
    /// Plain script and style files handed to a sink
    pub processed: usize,
    pub failures: Vec<UnitFailure>,
    pub sequence: Vec<String>,
    /// Components without a stylesheet
    pub missing_styles: Vec<String>,
    /// Configured base stylesheet that does not exist
    pub missing_base: Option<PathBuf>,
    /// `skip_install` entries matching no component
    pub unknown_skip_install: Vec<String>,
    pub entry: PathBuf,
    pub style: PathBuf,
    /// Generated files whose content changed
    pub written: Vec<PathBuf>,
}

impl BuildReport {
    /// Returns true if every unit and file was built
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
struct Sources {
    units: Vec<PathBuf>,
    scripts: Vec<PathBuf>,
    styles: Vec<PathBuf>,
}

/// Builds the project's output tree
pub fn build(project: &Project, decomposer: &Decomposer, version: &str) -> Result<BuildReport> {
    let config = &project.config().project;
    let src_dir = project.src_dir();
    let out_dir = project.out_dir();
    let style_ext = project.style_ext();

    let names = discover_components(&src_dir)?;
    let graph = deps::scan(&src_dir, &names)?;
    let sequence = sequence(&names, &graph).context("Failed to sequence component styles")?;

    clean_dir(&out_dir)?;
    let copied = copy_tree(&src_dir, &out_dir)?;
    let sources = collect_sources(&out_dir)?;

    let mut failures = Vec::new();

    let outcomes: Vec<_> = sources
        .units
        .par_iter()
        .map(|path| (path, decomposer.decompose(path)))
        .collect();

    let mut units = Vec::with_capacity(outcomes.len());
    for (path, outcome) in outcomes {
        match outcome {
            Ok(unit) => units.push(unit),
            Err(e) => failures.push(UnitFailure {
                path: path.clone(),
                message: e.to_string(),
            }),
        }
    }

    let toolchain = decomposer.toolchain();
    let plain: Vec<_> = sources
        .scripts
        .iter()
        .map(|path| (path, toolchain.script.as_ref(), true))
        .chain(sources.styles.iter().map(|path| (path, toolchain.style.as_ref(), false)))
        .collect();
    let processed = plain.len();

    let sink_failures: Vec<_> = plain
        .par_iter()
        .filter_map(|(path, sink, is_script)| {
            let rewritten = if *is_script {
                rewrite_script_imports(path)
            } else {
                Ok(())
            };
            rewritten
                .and_then(|()| sink.process(path))
                .err()
                .map(|e| UnitFailure {
                    path: path.to_path_buf(),
                    message: format!("{:#}", e),
                })
        })
        .collect();
    failures.extend(sink_failures);

    let mut written = Vec::new();

    let style_deps = StyleDeps {
        map: graph,
        sequence: sequence.clone(),
    };
    if style_deps.save(&out_dir)? {
        written.push(out_dir.join(deps::STYLE_DEPS_FILE));
    }

    let bindings: HashSet<String> = sequence.iter().map(|name| pascalize(name)).collect();
    let unknown_skip_install = config
        .build
        .skip_install
        .iter()
        .filter(|name| !bindings.contains(&pascalize(name)))
        .cloned()
        .collect();

    let entry_options = EntryOptions {
        named_export: config.build.named_export,
        skip_install: config.build.skip_install.clone(),
        path_resolver: Some(relative_resolver(&out_dir)),
        version: version.to_string(),
        src_dir: out_dir.clone(),
    };
    let entry_source = generate_entry(&sequence, &entry_options)?;
    let entry = out_dir.join(ENTRY_FILE);
    if write_if_changed(&entry, &entry_source)? {
        written.push(entry.clone());
    }

    let (base, missing_base) = match &config.build.css.base {
        Some(base) if out_dir.join(base).is_file() => (Some(out_dir.join(base)), None),
        Some(base) => (None, Some(src_dir.join(base))),
        None => (None, None),
    };
    let style_options = StyleOptions {
        base,
        lang: style_ext.to_string(),
        src_dir: out_dir.clone(),
        path_resolver: Some(relative_resolver(&out_dir)),
    };
    let generated = generate_style(&sequence, &style_options, |path| path.is_file());
    let style = out_dir.join(format!("index.{}", style_ext));
    if write_if_changed(&style, &generated.source)? {
        written.push(style.clone());
    }

    Ok(BuildReport {
        version: version.to_string(),
        copied,
        units,
        processed,
        failures,
        sequence,
        missing_styles: generated.missing,
        missing_base,
        unknown_skip_install,
        entry,
        style,
        written,
    })
}

/// Points a copied script's imports at decomposed artifacts
fn rewrite_script_imports(path: &Path) -> Result<()> {
    let code =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    write_if_changed(path, &rewrite_imports(path, &code))?;
    Ok(())
}

/// Sorts the output tree into units, scripts and stylesheets
fn collect_sources(dir: &Path) -> Result<Sources> {
    let mut sources = Sources::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        if ext == "vue" {
            sources.units.push(path);
        } else if SCRIPT_EXTENSIONS.contains(&ext) && !file_name.ends_with(".d.ts") {
            sources.scripts.push(path);
        } else if STYLE_EXTENSIONS.contains(&ext) {
            sources.styles.push(path);
        }
    }

    Ok(sources)
}

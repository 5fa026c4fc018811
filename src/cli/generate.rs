//! Single-stage commands: `decompose`, `sequence`, `entry`, `style`
//!
//! These run one pipeline stage against the source tree, so a stage can be
//! inspected or wired into another build tool.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;

use super::output::Output;
use crate::codegen::{generate_entry, generate_style, relative_resolver, EntryOptions, StyleOptions};
use crate::compiler::{Decomposer, Toolchain};
use crate::domain;
use crate::storage::deps::{self, StyleDeps};
use crate::storage::{write_if_changed, Config, Project};

pub fn decompose(output: &Output, files: &[PathBuf]) -> Result<()> {
    // Tools come from the enclosing project, if any
    let config = Config::load()?;
    let decomposer = Decomposer::new(Toolchain::from_config(&config.project.build.tools));

    let outcomes: Vec<_> = files
        .par_iter()
        .map(|path| (path, decomposer.decompose(path)))
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    for (path, outcome) in outcomes {
        match outcome {
            Ok(unit) => {
                for artifact in &unit.artifacts {
                    output.verbose_ctx("decompose", &artifact.display().to_string());
                }
                output.line(&format!(
                    "{} -> {} artifact(s)",
                    path.display(),
                    unit.artifacts.len()
                ));
                results.push(unit);
            }
            Err(e) => {
                output.error(&e.to_string());
                failed += 1;
            }
        }
    }

    if output.is_json() {
        output.data(&results);
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed to decompose", failed, files.len());
    }
    Ok(())
}

/// Discovered names, sequenced by style dependency
fn sequenced(output: &Output, project: &Project) -> Result<StyleDeps> {
    let src_dir = project.src_dir();
    let names = project.components()?;
    output.verbose_ctx("sequence", &format!("Discovered {} component(s)", names.len()));

    let map = deps::scan(&src_dir, &names)?;
    for (component, dependency) in map.edges() {
        output.verbose_ctx("sequence", &format!("{} depends on {}", component, dependency));
    }

    let sequence =
        domain::sequence(&names, &map).context("Failed to sequence component styles")?;
    Ok(StyleDeps { map, sequence })
}

pub fn sequence(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let deps = sequenced(output, &project)?;

    if output.is_json() {
        output.data(&deps);
    } else {
        for name in &deps.sequence {
            println!("{}", name);
        }
    }
    Ok(())
}

pub fn entry(output: &Output, target: Option<&Path>, pkg_version: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let config = &project.config().project;
    let deps = sequenced(output, &project)?;
    let version = project.resolve_version(pkg_version)?;

    let target = target.map(absolute).transpose()?;
    let options = EntryOptions {
        named_export: config.build.named_export,
        skip_install: config.build.skip_install.clone(),
        path_resolver: Some(relative_resolver(&import_base(&project, target.as_deref()))),
        version,
        src_dir: project.src_dir(),
    };

    let source = generate_entry(&deps.sequence, &options)?;
    emit(output, target.as_deref(), &source)
}

pub fn style(output: &Output, target: Option<&Path>) -> Result<()> {
    let project = Project::open_current()?;
    let config = &project.config().project;
    let deps = sequenced(output, &project)?;
    let src_dir = project.src_dir();

    let base = match &config.build.css.base {
        Some(base) if src_dir.join(base).is_file() => Some(src_dir.join(base)),
        Some(base) => {
            output.warn(&format!(
                "Base stylesheet not found: {}",
                src_dir.join(base).display()
            ));
            None
        }
        None => None,
    };

    let target = target.map(absolute).transpose()?;
    let options = StyleOptions {
        base,
        lang: project.style_ext().to_string(),
        src_dir,
        path_resolver: Some(relative_resolver(&import_base(&project, target.as_deref()))),
    };

    let generated = generate_style(&deps.sequence, &options, |path| path.is_file());
    for name in &generated.missing {
        output.verbose_ctx("style", &format!("No stylesheet for {}", name));
    }

    emit(output, target.as_deref(), &generated.source)
}

/// Directory that generated import paths are relative to
fn import_base(project: &Project, target: Option<&Path>) -> PathBuf {
    target
        .and_then(|t| t.parent())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project.src_dir())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

/// Writes the generated text to `target`, or prints it
fn emit(output: &Output, target: Option<&Path>, source: &str) -> Result<()> {
    match target {
        Some(path) => {
            let changed = write_if_changed(path, source)?;
            output.verbose_ctx(
                "write",
                &format!("{} ({})", path.display(), if changed { "updated" } else { "unchanged" }),
            );
            output.success(&format!("Wrote {}", path.display()));
        }
        None if output.is_json() => {
            output.data(&serde_json::json!({ "source": source }));
        }
        None => print!("{}", source),
    }
    Ok(())
}

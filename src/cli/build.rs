//! `sfcpack build` and its watch mode
//!
//! Watch mode rebuilds on debounced changes under the source directory and
//! `sfcpack.toml`. Changes under the output directory are ignored.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;

use super::output::Output;
use crate::compiler::{self, BuildReport, Decomposer, Toolchain};
use crate::storage::{Project, CONFIG_FILE};

/// Quiet period before a rebuild starts
const DEBOUNCE: Duration = Duration::from_millis(300);

pub fn run(output: &Output, watch: bool, pkg_version: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    output.verbose_ctx("build", &format!("Project root: {}", project.root().display()));

    if watch {
        return watch_loop(output, project, pkg_version);
    }

    let report = build_once(output, &project, pkg_version)?;
    if !report.is_success() {
        bail!("{} file(s) failed to build", report.failures.len());
    }
    Ok(())
}

fn build_once(output: &Output, project: &Project, pkg_version: Option<&str>) -> Result<BuildReport> {
    let version = project.resolve_version(pkg_version)?;
    let toolchain = Toolchain::from_config(&project.config().project.build.tools);
    let decomposer = Decomposer::new(toolchain);

    output.verbose_ctx(
        "build",
        &format!(
            "Building {} -> {} (version {})",
            project.src_dir().display(),
            project.out_dir().display(),
            version
        ),
    );

    let report = compiler::build(project, &decomposer, &version)?;
    print_report(output, project, &report);
    Ok(report)
}

fn print_report(output: &Output, project: &Project, report: &BuildReport) {
    output.verbose_ctx("build", &format!("Copied {} file(s)", report.copied));

    for unit in &report.units {
        let scope = unit
            .scope_id
            .as_ref()
            .map(|id| format!(", scope {}", id))
            .unwrap_or_default();
        output.verbose_ctx(
            "decompose",
            &format!("{}: {} artifact(s){}", unit.name, unit.artifacts.len(), scope),
        );
    }

    output.verbose_ctx("sequence", &report.sequence.join(" -> "));

    for name in &report.unknown_skip_install {
        output.verbose_ctx("entry", &format!("skip_install names no component: {}", name));
    }
    for name in &report.missing_styles {
        output.verbose_ctx("style", &format!("No stylesheet for {}", name));
    }
    if let Some(base) = &report.missing_base {
        output.warn(&format!("Base stylesheet not found: {}", base.display()));
    }
    for path in &report.written {
        output.verbose_ctx("write", &path.display().to_string());
    }

    for failure in &report.failures {
        output.error(&format!("{}: {}", failure.path.display(), failure.message));
    }

    if output.is_json() {
        output.data(report);
    } else {
        output.success(&format!(
            "Built {} component(s) into {} (version {})",
            report.sequence.len(),
            project.out_dir().display(),
            report.version
        ));
    }
}

/// Rebuilds on every debounced batch of source changes until the channel closes
fn watch_loop(output: &Output, project: Project, pkg_version: Option<&str>) -> Result<()> {
    let src_dir = project.src_dir();
    let out_dir = project.out_dir();

    if let Err(e) = build_once(output, &project, pkg_version) {
        output.error(&format!("{:#}", e));
    }

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx)?;

    debouncer
        .watcher()
        .watch(&src_dir, RecursiveMode::Recursive)?;
    debouncer
        .watcher()
        .watch(&project.root().join(CONFIG_FILE), RecursiveMode::NonRecursive)?;

    output.success(&format!("Watching {} for changes", src_dir.display()));

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events
                    .iter()
                    .filter(|e| !should_ignore_path(&e.path, &out_dir))
                    .count();

                if relevant == 0 {
                    continue;
                }

                output.verbose_ctx("watch", &format!("Detected {} change(s)", relevant));

                // Config edits take effect on the next rebuild
                let project = match Project::open(project.root()) {
                    Ok(reopened) => reopened,
                    Err(e) => {
                        output.error(&format!("{:#}", e));
                        continue;
                    }
                };

                if let Err(e) = build_once(output, &project, pkg_version) {
                    output.error(&format!("{:#}", e));
                }
            }
            Ok(Err(error)) => {
                output.error(&format!("Watch error: {:?}", error));
            }
            Err(e) => {
                output.verbose_ctx("watch", &format!("Channel closed: {}", e));
                break;
            }
        }
    }

    Ok(())
}

/// Checks if a path should be ignored by the watcher
fn should_ignore_path(path: &Path, out_dir: &Path) -> bool {
    if path.starts_with(out_dir) {
        return true;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    // Editor swap and backup files
    name.ends_with('~') || name.ends_with(".swp") || name.starts_with(".#") || name.ends_with(".tmp")
}

//! Component decomposition
//!
//! Splits one single-file component into standalone artifacts:
//!
//! ```text
//! button/index.vue ──► button/index.ts         (script + render + scope id)
//!                  ├─► button/index-sfc.less   (style block 1)
//!                  └─► button/index-sfc-2.css  (style block 2)
//! ```
//!
//! The source file is removed only after every artifact has been written and
//! handed to its sink. A failed write leaves the source in place.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use super::template::{CompiledTemplate, TemplateInput};
use super::Toolchain;
use crate::domain::naming::js_string;
use crate::domain::{
    name_for, rewrite_imports, scope_id, style_import_specifier, ArtifactKind, ComponentUnit,
    ParseError, ParseFailure, ScopeId, ScriptBlock,
};

const RENDER_FN: &str = "__vue_render__";
const BINDER: &str = "__vue_sfc__";
const EXPORT: &str = "export default";

#[derive(Debug, Error)]
pub enum DecomposeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Template compilation failed for {path}: {message}")]
    Template { path: String, message: String },

    #[error("Processing {path} failed: {message}")]
    Sink { path: String, message: String },
}

impl DecomposeError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        DecomposeError::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}

/// One file to be written for a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub contents: String,
}

/// Result of decomposing one unit
#[derive(Debug, Clone, Serialize)]
pub struct Decomposed {
    pub name: String,
    pub source_path: PathBuf,
    pub scope_id: Option<ScopeId>,
    pub artifacts: Vec<PathBuf>,
}

/// Decomposes single-file components with a given toolchain
pub struct Decomposer {
    toolchain: Toolchain,
}

impl Decomposer {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Reads, splits and writes one unit, then removes its source file
    pub fn decompose(&self, path: &Path) -> Result<Decomposed, DecomposeError> {
        let source =
            fs::read_to_string(path).map_err(|e| DecomposeError::io("read", path, e))?;
        let unit = ComponentUnit::parse(path, source, self.toolchain.parser.as_ref())?;
        let scope_id = scope_id(&unit.source, &unit.styles);
        let artifacts = self.plan(&unit, scope_id.as_ref())?;

        // Writes are independent of each other
        artifacts
            .par_iter()
            .map(|artifact| {
                fs::write(&artifact.path, &artifact.contents)
                    .map_err(|e| DecomposeError::io("write", &artifact.path, e))
            })
            .collect::<Result<Vec<()>, _>>()?;

        for artifact in &artifacts {
            let sink = if artifact.kind.is_style() {
                self.toolchain.style.as_ref()
            } else {
                self.toolchain.script.as_ref()
            };
            sink.process(&artifact.path)
                .map_err(|e| DecomposeError::Sink {
                    path: artifact.path.display().to_string(),
                    message: format!("{:#}", e),
                })?;
        }

        fs::remove_file(path).map_err(|e| DecomposeError::io("remove", path, e))?;

        Ok(Decomposed {
            name: unit.name,
            source_path: unit.source_path,
            scope_id,
            artifacts: artifacts.into_iter().map(|a| a.path).collect(),
        })
    }

    /// Computes every artifact for `unit` without touching the filesystem
    pub fn plan(
        &self,
        unit: &ComponentUnit,
        scope_id: Option<&ScopeId>,
    ) -> Result<Vec<Artifact>, DecomposeError> {
        let mut artifacts = Vec::with_capacity(unit.styles.len() + 1);

        // Template-only units get an empty component definition
        let script = match (&unit.script, &unit.template) {
            (Some(script), _) => Some(script.clone()),
            (None, Some(_)) => Some(ScriptBlock {
                content: format!("{} {{}}", EXPORT),
                lang: None,
            }),
            (None, None) => None,
        };

        if let Some(script) = script {
            let compiled = match &unit.template {
                Some(template) => {
                    let input = TemplateInput {
                        source: &template.content,
                        lang: template.lang.as_deref(),
                        scope_id,
                        path: &unit.source_path,
                    };
                    let compiled = self.toolchain.template.compile(&input).map_err(|e| {
                        DecomposeError::Template {
                            path: unit.source_path.display().to_string(),
                            message: format!("{:#}", e),
                        }
                    })?;
                    Some(compiled)
                }
                None => None,
            };

            let contents = rewrite_script(unit, &script, compiled.as_ref(), scope_id)?;
            let kind = ArtifactKind::script(script.lang());
            artifacts.push(Artifact {
                path: name_for(&unit.source_path, &kind),
                kind,
                contents,
            });
        }

        for (index, style) in unit.styles.iter().enumerate() {
            // TODO: run scoped blocks through a CSS scoping pass once a style compiler seam takes the scope id
            let kind = ArtifactKind::style(style.lang.clone(), index);
            artifacts.push(Artifact {
                path: name_for(&unit.source_path, &kind),
                kind,
                contents: trim(&style.content),
            });
        }

        Ok(artifacts)
    }
}

/// Drops empty `//` comment lines and surrounding whitespace
fn trim(code: &str) -> String {
    code.replace("//\n", "").trim().to_string()
}

/// Rewrites a script so it binds the component, attaches render and scope id,
/// imports its own styles, and only then exports it
fn rewrite_script(
    unit: &ComponentUnit,
    script: &ScriptBlock,
    compiled: Option<&CompiledTemplate>,
    scope_id: Option<&ScopeId>,
) -> Result<String, DecomposeError> {
    let body = rewrite_imports(&unit.source_path, &trim(&script.content));
    if !body.contains(EXPORT) {
        return Err(ParseError::new(&unit.source_path, ParseFailure::MissingDefaultExport).into());
    }
    let body = body.replacen(EXPORT, &format!("const {} =", BINDER), 1);

    let mut out = String::new();
    for index in 0..unit.styles.len() {
        out.push_str(&format!("import '{}';\n", style_import_specifier(&unit.source_path, index)));
    }
    out.push_str(&body);
    out.push('\n');

    match compiled {
        Some(CompiledTemplate::Render(code)) => {
            let marker = "export function render";
            if !code.contains(marker) {
                return Err(DecomposeError::Template {
                    path: unit.source_path.display().to_string(),
                    message: "compiled template does not define `export function render`".into(),
                });
            }
            let code = code.replacen(marker, &format!("function {}", RENDER_FN), 1);
            out.push('\n');
            out.push_str(code.trim());
            out.push('\n');
            out.push_str(&format!("{}.render = {};\n", BINDER, RENDER_FN));
        }
        Some(CompiledTemplate::Source(markup)) => {
            out.push_str(&format!("{}.template = '{}';\n", BINDER, js_string(markup)));
        }
        None => {}
    }

    if let Some(id) = scope_id {
        out.push_str(&format!("{}._scopeId = '{}';\n", BINDER, id));
    }

    out.push_str(&format!("{} {};\n", EXPORT, BINDER));
    Ok(out)
}

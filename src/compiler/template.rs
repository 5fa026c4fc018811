//! Template compiler seam
//!
//! Template-to-render compilation is done by an external tool. Two
//! implementations ship with the crate:
//! - [`RuntimeTemplateCompiler`] hands raw markup to the host runtime
//!   (requires a runtime build that includes the template compiler)
//! - [`CommandTemplateCompiler`] spawns a configured command

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::domain::ScopeId;

/// What the compiler receives for one template
#[derive(Debug, Clone, Copy)]
pub struct TemplateInput<'a> {
    pub source: &'a str,
    pub lang: Option<&'a str>,
    pub scope_id: Option<&'a ScopeId>,
    pub path: &'a Path,
}

/// Compiler output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledTemplate {
    /// Module code defining `export function render`
    Render(String),
    /// Raw markup, assigned as the component's `template` option
    Source(String),
}

pub trait TemplateCompiler: Send + Sync {
    fn compile(&self, input: &TemplateInput<'_>) -> Result<CompiledTemplate>;
}

/// Leaves compilation to the runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeTemplateCompiler;

impl TemplateCompiler for RuntimeTemplateCompiler {
    fn compile(&self, input: &TemplateInput<'_>) -> Result<CompiledTemplate> {
        if let Some(lang) = input.lang.filter(|l| *l != "html") {
            anyhow::bail!(
                "template lang '{}' needs a template compiler command (build.tools.template)",
                lang
            );
        }
        Ok(CompiledTemplate::Source(input.source.trim().to_string()))
    }
}

/// Runs an external command: template on stdin, render module on stdout
///
/// Argument placeholders: `{file}`, `{scope_id}` (empty when unscoped), `{lang}`.
#[derive(Debug, Clone)]
pub struct CommandTemplateCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandTemplateCompiler {
    /// Builds a compiler from `[program, args...]`; `None` if empty
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn expand(&self, input: &TemplateInput<'_>) -> Vec<String> {
        let scope_id = input.scope_id.map(|id| id.to_string()).unwrap_or_default();
        let file = input.path.display().to_string();
        let lang = input.lang.unwrap_or("html");

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{file}", &file)
                    .replace("{scope_id}", &scope_id)
                    .replace("{lang}", lang)
            })
            .collect()
    }
}

impl TemplateCompiler for CommandTemplateCompiler {
    fn compile(&self, input: &TemplateInput<'_>) -> Result<CompiledTemplate> {
        let mut child = Command::new(&self.program)
            .args(self.expand(input))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn template compiler: {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("Failed to open template compiler stdin")?;

        // Feed stdin from a separate thread so a chatty compiler cannot block on stdout
        let output = std::thread::scope(|scope| -> Result<std::process::Output> {
            let writer = scope.spawn(move || stdin.write_all(input.source.as_bytes()));
            let output = child.wait_with_output();
            let written = writer
                .join()
                .map_err(|_| anyhow::anyhow!("template writer thread panicked"))?;
            written.context("Failed to write template to compiler")?;
            output.context("Failed to read template compiler output")
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Template compiler returned error: {}", stderr.trim());
        }

        let code = String::from_utf8(output.stdout)
            .context("Template compiler output is not valid UTF-8")?;
        Ok(CompiledTemplate::Render(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(source: &'a str, scope_id: Option<&'a ScopeId>) -> TemplateInput<'a> {
        TemplateInput {
            source,
            lang: None,
            scope_id,
            path: Path::new("src/button/index.vue"),
        }
    }

    #[test]
    fn runtime_compiler_returns_trimmed_markup() {
        let compiled = RuntimeTemplateCompiler
            .compile(&input("\n  <button><slot/></button>\n", None))
            .unwrap();
        assert_eq!(compiled, CompiledTemplate::Source("<button><slot/></button>".into()));
    }

    #[test]
    fn runtime_compiler_rejects_preprocessed_templates() {
        let mut pug = input("button", None);
        pug.lang = Some("pug");
        assert!(RuntimeTemplateCompiler.compile(&pug).is_err());
    }

    #[test]
    fn command_placeholders_expand() {
        let compiler = CommandTemplateCompiler::from_command(&[
            "vue-template".to_string(),
            "--id={scope_id}".to_string(),
            "{file}".to_string(),
        ])
        .unwrap();
        let id = ScopeId::from_source("x");
        let args = compiler.expand(&input("<div/>", Some(&id)));
        assert_eq!(args, vec![format!("--id={}", id), "src/button/index.vue".to_string()]);
    }

    #[test]
    fn empty_command_is_none() {
        assert!(CommandTemplateCompiler::from_command(&[]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn command_compiler_reads_stdout() {
        let compiler = CommandTemplateCompiler::from_command(&["cat".to_string()]).unwrap();
        let compiled = compiler
            .compile(&input("export function render() { return null }", None))
            .unwrap();
        assert_eq!(
            compiled,
            CompiledTemplate::Render("export function render() { return null }".into())
        );
    }

    #[cfg(unix)]
    #[test]
    fn command_compiler_failure_is_reported() {
        let compiler = CommandTemplateCompiler::from_command(&["false".to_string()]).unwrap();
        assert!(compiler.compile(&input("<div/>", None)).is_err());
    }
}

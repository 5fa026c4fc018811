//! # Compiler Layer
//!
//! Turns a source tree of single-file components into a publishable output
//! tree:
//!
//! ```text
//! src/ ──copy──► es/ ──decompose (parallel)──► es/<name>/index.{js,ts} + index-sfc*.{css,less,scss}
//!                     ──sinks──► script transpiler / style compiler
//!                     ──sequence──► es/style-deps.json
//!                     ──codegen──► es/index.js + es/index.<lang>
//! ```
//!
//! External tools sit behind three seams bundled in a [`Toolchain`]: the
//! structural parser ([`SfcParser`]), the [`TemplateCompiler`] and the two
//! [`ArtifactSink`]s.

mod decompose;
mod pipeline;
pub mod sink;
pub mod template;

pub use decompose::{Artifact, DecomposeError, Decomposed, Decomposer};
pub use pipeline::{build, BuildReport, UnitFailure};
pub use sink::{ArtifactSink, CommandSink, NoopSink};
pub use template::{
    CommandTemplateCompiler, CompiledTemplate, RuntimeTemplateCompiler, TemplateCompiler,
    TemplateInput,
};

use crate::domain::{BlockParser, SfcParser};
use crate::storage::ToolsConfig;

/// The external tools used by a build
pub struct Toolchain {
    pub parser: Box<dyn SfcParser>,
    pub template: Box<dyn TemplateCompiler>,
    /// Runs on every script artifact and plain script file
    pub script: Box<dyn ArtifactSink>,
    /// Runs on every style artifact and plain stylesheet
    pub style: Box<dyn ArtifactSink>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            parser: Box::new(BlockParser),
            template: Box::new(RuntimeTemplateCompiler),
            script: Box::new(NoopSink),
            style: Box::new(NoopSink),
        }
    }
}

impl Toolchain {
    /// Builds a toolchain from `[build.tools]`; unset tools use the built-ins
    pub fn from_config(tools: &ToolsConfig) -> Self {
        let mut toolchain = Self::default();

        if let Some(compiler) = CommandTemplateCompiler::from_command(&tools.template) {
            toolchain.template = Box::new(compiler);
        }
        if let Some(sink) = CommandSink::from_command(&tools.script) {
            toolchain.script = Box::new(sink);
        }
        if let Some(sink) = CommandSink::from_command(&tools.style) {
            toolchain.style = Box::new(sink);
        }

        toolchain
    }
}

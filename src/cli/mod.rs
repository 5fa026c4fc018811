//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Write a default `sfcpack.toml` |
//! | `build` | Full pipeline into the output directory (`--watch` to keep rebuilding) |
//! | `decompose` | Split individual component files in place |
//! | `sequence` | Print the style dependency order |
//! | `entry` | Generate the library entry module |
//! | `style` | Generate the aggregated stylesheet |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! sfcpack --verbose build
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod build;
mod generate;
mod output;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};

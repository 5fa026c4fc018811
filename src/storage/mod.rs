//! # Storage Layer
//!
//! Filesystem side of the pipeline: configuration, project layout, the
//! style dependency map and generated output files.
//!
//! ## Files
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `sfcpack.toml` |
//! | Style dependency map | JSON | `<out_dir>/style-deps.json` |
//! | Entry module | JS | `<out_dir>/index.js` |
//! | Aggregated stylesheet | CSS/Less/Scss | `<out_dir>/index.<lang>` |
//!
//! ## Project Structure
//!
//! ```text
//! sfcpack.toml
//! src/
//! ├── button/
//! │   ├── index.vue         # Component unit
//! │   └── demo/             # Never copied to the output
//! └── style/
//!     └── base.less         # Optional base stylesheet
//! es/                       # Output tree (rebuilt on every build)
//! ```
//!
//! All generated files are written atomically (temp file + rename) and
//! only when their content changed.

mod config;
pub mod deps;
pub mod output;
mod project;

pub use config::{
    BuildConfig, Config, ConfigError, CssConfig, CssLang, ProjectConfig, ToolsConfig, CONFIG_FILE,
};
pub use deps::StyleDeps;
pub use output::write_if_changed;
pub use project::{discover_components, Project, ProjectError};

//! Project management
//!
//! Handles project initialization, component discovery and the well-known
//! paths of a component library.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::CONFIG_FILE;
use super::Config;

/// Entry file names that make a directory a component
const ENTRY_FILES: &[&str] = &["index.vue", "index.tsx", "index.ts", "index.jsx", "index.js"];

const DEFAULT_CONFIG: &str = r#"# sfcpack configuration

# Library version; falls back to package.json when omitted
# version = "1.0.0"

src_dir = "src"
out_dir = "es"

[build]
# Re-export every symbol of each component module
named_export = false

# Components imported and exported but not registered by install()
skip_install = []

[build.css]
# css | less | scss
preprocessor = "css"

# Base stylesheet imported first, relative to src_dir
# base = "style/base.css"

[build.tools]
# External commands; {file}, {scope_id} and {lang} are substituted
# template = ["vue-template-compiler", "--scope-id", "{scope_id}"]
# script = ["babel", "{file}", "--out-file", "{file}"]
# style = ["lessc", "{file}"]
"#;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a sfcpack project. Run 'sfcpack init' first.")]
    NotInProject,

    #[error("No library version: set `version` in sfcpack.toml, add package.json, or pass --pkg-version")]
    NoVersion,
}

/// A component library project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(CONFIG_FILE).is_file() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create directory: {}", root.display()))?;

        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let project = Self::open(root)?;

        let src_dir = project.src_dir();
        fs::create_dir_all(&src_dir)
            .with_context(|| format!("Failed to create source directory: {}", src_dir.display()))?;

        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the component source directory
    pub fn src_dir(&self) -> PathBuf {
        self.root.join(&self.config.project.src_dir)
    }

    /// Returns the build output directory
    pub fn out_dir(&self) -> PathBuf {
        self.root.join(&self.config.project.out_dir)
    }

    /// Style language extension
    pub fn style_ext(&self) -> &'static str {
        self.config.project.build.css.preprocessor.ext()
    }

    /// Component names under the source directory
    pub fn components(&self) -> Result<Vec<String>> {
        discover_components(&self.src_dir())
    }

    /// Resolves the library version
    ///
    /// `override_version` wins, then `version` in sfcpack.toml, then the
    /// `version` field of package.json.
    pub fn resolve_version(&self, override_version: Option<&str>) -> Result<String> {
        if let Some(version) = override_version.filter(|v| !v.is_empty()) {
            return Ok(version.to_string());
        }

        if let Some(version) = &self.config.project.version {
            return Ok(version.clone());
        }

        let package_json = self.root.join("package.json");
        if package_json.is_file() {
            let content = fs::read_to_string(&package_json)
                .with_context(|| format!("Failed to read {}", package_json.display()))?;
            let manifest: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", package_json.display()))?;
            if let Some(version) = manifest.get("version").and_then(|v| v.as_str()) {
                return Ok(version.to_string());
            }
        }

        Err(ProjectError::NoVersion.into())
    }
}

/// Lists component names under `dir`, sorted
///
/// A component is a directory containing one of `index.{vue,tsx,ts,jsx,js}`.
pub fn discover_components(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if ENTRY_FILES.iter().any(|file| path.join(file).is_file()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}

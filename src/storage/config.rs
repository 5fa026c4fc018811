//! Configuration handling for sfcpack
//!
//! Configuration is stored in `sfcpack.toml` at the project root. Every
//! section is optional and falls back to its defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::naming::lexical_normalize;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "sfcpack.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Style language of the component library
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CssLang {
    #[default]
    Css,
    Less,
    Scss,
}

impl CssLang {
    /// File extension for this language
    pub fn ext(&self) -> &'static str {
        match self {
            CssLang::Css => "css",
            CssLang::Less => "less",
            CssLang::Scss => "scss",
        }
    }
}

/// Stylesheet settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CssConfig {
    /// Preprocessor used by component stylesheets
    pub preprocessor: CssLang,

    /// Base stylesheet imported before any component, relative to `src_dir`
    pub base: Option<PathBuf>,
}

/// External commands, each `[program, args...]`
///
/// Empty means "not configured".
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolsConfig {
    /// Template compiler (`{file}`, `{scope_id}`, `{lang}` placeholders)
    pub template: Vec<String>,

    /// Script transpiler run on every script artifact (`{file}`)
    pub script: Vec<String>,

    /// Style compiler run on every style artifact (`{file}`)
    pub style: Vec<String>,
}

/// Build settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BuildConfig {
    /// Re-export each component module with `export *`
    pub named_export: bool,

    /// Components imported and exported but not registered by `install`
    pub skip_install: Vec<String>,

    pub css: CssConfig,

    pub tools: ToolsConfig,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Library name
    pub name: Option<String>,

    /// Library version (falls back to package.json)
    pub version: Option<String>,

    /// Directory holding one directory per component
    pub src_dir: PathBuf,

    /// Build output directory
    pub out_dir: PathBuf,

    pub build: BuildConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            version: None,
            src_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("es"),
            build: BuildConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Checks settings that parse but cannot be built
    ///
    /// The build wipes `out_dir`, so it must be a directory of its own under
    /// the project root that neither holds nor sits inside `src_dir`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let src_dir = project_dir("src_dir", &self.src_dir)?;
        let out_dir = project_dir("out_dir", &self.out_dir)?;

        if out_dir == src_dir {
            return Err(ConfigError::Invalid(format!(
                "src_dir and out_dir must differ (both are '{}')",
                self.src_dir.display()
            )));
        }
        if out_dir.starts_with(&src_dir) {
            return Err(ConfigError::Invalid(format!(
                "out_dir '{}' must not be inside src_dir '{}'",
                self.out_dir.display(),
                self.src_dir.display()
            )));
        }
        if src_dir.starts_with(&out_dir) {
            return Err(ConfigError::Invalid(format!(
                "out_dir '{}' must not contain src_dir '{}'",
                self.out_dir.display(),
                self.src_dir.display()
            )));
        }
        if let Some(base) = &self.build.css.base {
            if base.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "build.css.base must be relative to src_dir: {}",
                    base.display()
                )));
            }
        }
        Ok(())
    }
}

/// Normalizes a configured directory, which must stay under the project root
fn project_dir(key: &str, dir: &Path) -> Result<PathBuf, ConfigError> {
    if dir.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
    }
    if dir.has_root() || dir.is_absolute() {
        return Err(ConfigError::Invalid(format!(
            "{} must be relative to the project root: {}",
            key,
            dir.display()
        )));
    }

    let normalized = lexical_normalize(dir);
    if normalized.starts_with("..") {
        return Err(ConfigError::Invalid(format!(
            "{} must stay inside the project root: {}",
            key,
            dir.display()
        )));
    }
    Ok(normalized)
}

/// Loaded configuration and where it came from
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for the project containing the current directory
    pub fn load() -> Result<Self> {
        match Self::find_project_root() {
            Some(root) => Self::for_project(&root),
            None => Ok(Self {
                project: ProjectConfig::default(),
                project_root: None,
            }),
        }
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Finds the project root by looking for `sfcpack.toml`
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Walks up from `start` looking for `sfcpack.toml`
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = ProjectConfig::default();

        assert_eq!(config.src_dir, PathBuf::from("src"));
        assert_eq!(config.out_dir, PathBuf::from("es"));
        assert!(!config.build.named_export);
        assert_eq!(config.build.css.preprocessor, CssLang::Css);
        assert!(config.build.tools.template.is_empty());
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
name = "demo-ui"
version = "2.1.0"

[build]
named_export = true
skip_install = ["lazyload"]

[build.css]
preprocessor = "less"
base = "style/base.less"

[build.tools]
style = ["lessc", "{file}"]
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.name.as_deref(), Some("demo-ui"));
        assert_eq!(config.version.as_deref(), Some("2.1.0"));
        assert!(config.build.named_export);
        assert_eq!(config.build.skip_install, vec!["lazyload"]);
        assert_eq!(config.build.css.preprocessor.ext(), "less");
        assert_eq!(config.build.css.base, Some(PathBuf::from("style/base.less")));
        assert_eq!(config.build.tools.style, vec!["lessc", "{file}"]);
        // Omitted keys keep their defaults
        assert_eq!(config.src_dir, PathBuf::from("src"));
    }

    #[test]
    fn unknown_preprocessor_rejected() {
        let toml = "[build.css]\npreprocessor = \"stylus\"\n";
        assert!(toml::from_str::<ProjectConfig>(toml).is_err());
    }

    fn dirs(src_dir: &str, out_dir: &str) -> ProjectConfig {
        ProjectConfig {
            src_dir: PathBuf::from(src_dir),
            out_dir: PathBuf::from(out_dir),
            ..ProjectConfig::default()
        }
    }

    fn assert_invalid(config: &ProjectConfig, needle: &str) {
        match config.validate() {
            Err(ConfigError::Invalid(message)) => {
                assert!(message.contains(needle), "unexpected message: {}", message)
            }
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn same_src_and_out_is_invalid() {
        assert_invalid(&dirs("src", "src"), "must differ");
        assert_invalid(&dirs("src", "./src"), "must differ");
        assert_invalid(&dirs("src", "lib/../src"), "must differ");
    }

    #[test]
    fn out_dir_containing_src_is_invalid() {
        assert_invalid(&dirs("lib/src", "lib"), "must not contain");
        assert_invalid(&dirs("src", "."), "must not contain");
    }

    #[test]
    fn out_dir_inside_src_is_invalid() {
        assert_invalid(&dirs("src", "src/es"), "must not be inside");
        assert_invalid(&dirs(".", "es"), "must not be inside");
    }

    #[test]
    fn out_dir_outside_root_is_invalid() {
        assert_invalid(&dirs("src", ".."), "inside the project root");
        assert_invalid(&dirs("src", "es/../../es"), "inside the project root");
        assert_invalid(&dirs("../src", "es"), "inside the project root");

        let absolute = std::env::temp_dir().join("es");
        let config = ProjectConfig {
            out_dir: absolute,
            ..ProjectConfig::default()
        };
        assert_invalid(&config, "relative to the project root");
    }

    #[test]
    fn sibling_dirs_are_valid() {
        assert!(dirs("src", "es").validate().is_ok());
        assert!(dirs("packages/src", "packages/es").validate().is_ok());
        assert!(dirs("src", "src-es").validate().is_ok());
    }

    #[test]
    fn empty_dirs_are_invalid() {
        assert_invalid(&dirs("", "es"), "src_dir must not be empty");
        assert_invalid(&dirs("src", ""), "out_dir must not be empty");
    }

    #[test]
    fn absolute_base_is_invalid() {
        let mut config = ProjectConfig::default();
        config.build.css.base = Some(std::env::temp_dir().join("base.css"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn for_project_reads_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "out_dir = \"lib\"\n").unwrap();

        let config = Config::for_project(dir.path()).unwrap();
        assert_eq!(config.project.out_dir, PathBuf::from("lib"));
        assert_eq!(config.project_root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn for_project_rejects_out_dir_over_sources() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "out_dir = \"./src\"\n").unwrap();

        let err = Config::for_project(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("src_dir and out_dir must differ"));
    }

    #[test]
    fn for_project_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "src_dir = [").unwrap();

        let err = Config::for_project(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn find_project_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        let sub_dir = dir.path().join("src").join("button");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }
}

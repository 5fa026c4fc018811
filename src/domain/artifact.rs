//! Artifact naming for decomposed units
//!
//! File name scheme (downstream imports depend on it exactly):
//! - Script: `<base>.<scriptLang>` (e.g., `index.vue` -> `index.ts`)
//! - First style block: `<base>-sfc.<styleLang>`
//! - Later style blocks: `<base>-sfc-<n>.<styleLang>`, `n` starting at 2
//!
//! Scripts that import other units or preprocessor stylesheets are pointed at
//! these artifacts by [`rewrite_imports`].

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Extension used for style imports injected into rewritten scripts.
/// The style compiler emits CSS next to the preprocessor source.
pub const COMPILED_STYLE_EXT: &str = "css";

/// Preprocessor extensions whose imports are pointed at compiled CSS
const PREPROCESSOR_EXTS: &[&str] = &["less", "scss"];

/// Directory whose scripts import preprocessor sources on purpose
const STYLE_DIR: &str = "style";

lazy_static! {
    // from '..' | import '..' | import('..') | require('..')
    static ref SPECIFIER_RE: Regex =
        Regex::new(r#"(\bfrom\s*|\bimport\s*\(?\s*|\brequire\(\s*)(['"])([^'"\n]+)['"]"#).unwrap();
}

/// What an artifact holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The rewritten script
    Script { lang: String },
    /// The style block at `index` (zero-based)
    Style { lang: String, index: usize },
}

impl ArtifactKind {
    pub fn script(lang: impl Into<String>) -> Self {
        ArtifactKind::Script { lang: lang.into() }
    }

    pub fn style(lang: impl Into<String>, index: usize) -> Self {
        ArtifactKind::Style {
            lang: lang.into(),
            index,
        }
    }

    /// Returns true for style artifacts
    pub fn is_style(&self) -> bool {
        matches!(self, ArtifactKind::Style { .. })
    }
}

/// Derives the output path for an artifact of `kind` produced from `path`
pub fn name_for(path: &Path, kind: &ArtifactKind) -> PathBuf {
    match kind {
        ArtifactKind::Script { lang } => path.with_extension(lang),
        ArtifactKind::Style { lang, index } => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file_name = format!("{}{}.{}", stem, style_suffix(*index), lang);
            path.with_file_name(file_name)
        }
    }
}

/// Import specifier for the compiled form of the style block at `index`
pub fn style_import_specifier(path: &Path, index: usize) -> String {
    let compiled = name_for(path, &ArtifactKind::style(COMPILED_STYLE_EXT, index));
    let file_name = compiled
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("./{}", file_name)
}

/// Points the relative imports of a script at decomposed artifacts
///
/// `./item.vue` becomes `./item`. Imports of `.less` and `.scss` files become
/// `.css`, except in scripts under a `style` directory. Package imports are
/// left alone.
pub fn rewrite_imports(path: &Path, code: &str) -> String {
    let compile_styles = !path
        .parent()
        .is_some_and(|dir| dir.components().any(|c| c.as_os_str() == STYLE_DIR));

    SPECIFIER_RE
        .replace_all(code, |caps: &Captures| {
            let quote = &caps[2];
            format!(
                "{}{}{}{}",
                &caps[1],
                quote,
                rewrite_specifier(&caps[3], compile_styles),
                quote
            )
        })
        .into_owned()
}

fn rewrite_specifier(specifier: &str, compile_styles: bool) -> String {
    if !specifier.starts_with('.') {
        return specifier.to_string();
    }
    if let Some(stem) = specifier.strip_suffix(".vue") {
        return stem.to_string();
    }
    if compile_styles {
        if let Some((stem, ext)) = specifier.rsplit_once('.') {
            if PREPROCESSOR_EXTS.contains(&ext) && !stem.is_empty() && !stem.ends_with('/') {
                return format!("{}.{}", stem, COMPILED_STYLE_EXT);
            }
        }
    }
    specifier.to_string()
}

fn style_suffix(index: usize) -> String {
    if index == 0 {
        "-sfc".to_string()
    } else {
        format!("-sfc-{}", index + 1)
    }
}

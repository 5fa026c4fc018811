//! Single-file component model and structural parser
//!
//! A unit bundles up to one `<template>`, up to one `<script>` and any number
//! of `<style>` blocks. Other top-level blocks (docs, i18n, ...) are skipped.
//!
//! Parsing goes through the [`SfcParser`] trait so a full compiler front end
//! can be swapped in; [`BlockParser`] is the built-in block scanner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref OPEN_TAG_RE: Regex = Regex::new(r"^<([a-zA-Z][a-zA-Z0-9-]*)((?:[^>\x22']|\x22[^\x22]*\x22|'[^']*')*)>").unwrap();
    static ref ATTR_RE: Regex = Regex::new(r#"([^\s=/"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^>\s"']+)))?"#).unwrap();
}

/// Why a unit could not be parsed
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseFailure {
    #[error("unclosed <{0}> block")]
    UnclosedBlock(String),

    #[error("duplicate <{0}> block")]
    DuplicateBlock(String),

    #[error("<script setup> is not supported")]
    ScriptSetup,

    #[error("<{0} src=...> imports are not supported")]
    ExternalSource(String),

    #[error("script has no `export default`")]
    MissingDefaultExport,
}

/// A parse failure for one unit, carrying the unit's path
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Failed to parse {path}: {reason}")]
pub struct ParseError {
    pub path: String,
    pub reason: ParseFailure,
}

impl ParseError {
    pub fn new(path: &Path, reason: ParseFailure) -> Self {
        Self {
            path: path.display().to_string(),
            reason,
        }
    }
}

/// The `<template>` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBlock {
    pub content: String,
    pub lang: Option<String>,
}

/// The `<script>` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    pub content: String,
    pub lang: Option<String>,
}

impl ScriptBlock {
    /// Script language, `js` when unspecified
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or("js")
    }
}

/// A `<style>` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBlock {
    pub content: String,
    pub lang: String,
    pub scoped: bool,
}

/// Raw structural parse result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSfc {
    pub template: Option<TemplateBlock>,
    pub script: Option<ScriptBlock>,
    pub styles: Vec<StyleBlock>,
}

/// Structural parser seam: source text in, blocks out
pub trait SfcParser: Send + Sync {
    fn parse(&self, source: &str, path: &Path) -> Result<ParsedSfc, ParseError>;
}

/// One component source unit, immutable after parsing
#[derive(Debug, Clone)]
pub struct ComponentUnit {
    /// Kebab-case component name
    pub name: String,
    pub source_path: PathBuf,
    /// Full source text (the scope id is derived from it)
    pub source: String,
    pub script: Option<ScriptBlock>,
    pub template: Option<TemplateBlock>,
    pub styles: Vec<StyleBlock>,
}

impl ComponentUnit {
    /// Parses a unit from its source text
    pub fn parse(
        source_path: impl Into<PathBuf>,
        source: impl Into<String>,
        parser: &dyn SfcParser,
    ) -> Result<Self, ParseError> {
        let source_path = source_path.into();
        let source = source.into();
        let parsed = parser.parse(&source, &source_path)?;

        Ok(Self {
            name: component_name(&source_path),
            source_path,
            source,
            script: parsed.script,
            template: parsed.template,
            styles: parsed.styles,
        })
    }
}

/// Derives the component name from its path
///
/// `src/demo-button/index.vue` is `demo-button`; any other file uses its stem.
pub fn component_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if stem == "index" {
        if let Some(dir) = path.parent().and_then(|p| p.file_name()) {
            return dir.to_string_lossy().into_owned();
        }
    }
    stem
}

/// Built-in scanner for top-level SFC blocks
///
/// Nested `<template>` tags inside the template are balanced. `<script>` and
/// `<style>` contents are raw text and end at the first closing tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockParser;

impl SfcParser for BlockParser {
    fn parse(&self, source: &str, path: &Path) -> Result<ParsedSfc, ParseError> {
        let fail = |reason| ParseError::new(path, reason);
        let lower = source.to_ascii_lowercase();
        let mut parsed = ParsedSfc::default();
        let mut pos = 0;

        while let Some(offset) = source[pos..].find('<') {
            let start = pos + offset;

            if source[start..].starts_with("<!--") {
                match source[start..].find("-->") {
                    Some(end) => {
                        pos = start + end + 3;
                        continue;
                    }
                    None => return Err(fail(ParseFailure::UnclosedBlock("!--".into()))),
                }
            }

            let caps = match OPEN_TAG_RE.captures(&source[start..]) {
                Some(caps) => caps,
                None => {
                    pos = start + 1;
                    continue;
                }
            };

            let tag = caps[1].to_ascii_lowercase();
            let raw_attrs = caps.get(2).map_or("", |m| m.as_str());
            let open_end = start + caps[0].len();
            let self_closing = raw_attrs.trim_end().ends_with('/');
            let attrs = parse_attrs(raw_attrs.trim_end().trim_end_matches('/'));

            let (content, next) = if self_closing {
                (String::new(), open_end)
            } else {
                let (content_end, close_end) = match tag.as_str() {
                    "script" | "style" => find_raw_close(&lower, &tag, open_end),
                    _ => find_balanced_close(&lower, &tag, open_end),
                }
                .ok_or_else(|| fail(ParseFailure::UnclosedBlock(tag.clone())))?;
                (source[open_end..content_end].to_string(), close_end)
            };

            match tag.as_str() {
                "template" => {
                    if parsed.template.is_some() {
                        return Err(fail(ParseFailure::DuplicateBlock(tag)));
                    }
                    reject_src(&attrs, &tag).map_err(fail)?;
                    parsed.template = Some(TemplateBlock {
                        content,
                        lang: attr_value(&attrs, "lang"),
                    });
                }
                "script" => {
                    if attrs.contains_key("setup") {
                        return Err(fail(ParseFailure::ScriptSetup));
                    }
                    if parsed.script.is_some() {
                        return Err(fail(ParseFailure::DuplicateBlock(tag)));
                    }
                    reject_src(&attrs, &tag).map_err(fail)?;
                    parsed.script = Some(ScriptBlock {
                        content,
                        lang: attr_value(&attrs, "lang"),
                    });
                }
                "style" => {
                    reject_src(&attrs, &tag).map_err(fail)?;
                    parsed.styles.push(StyleBlock {
                        content,
                        lang: attr_value(&attrs, "lang").unwrap_or_else(|| "css".to_string()),
                        scoped: attrs.contains_key("scoped"),
                    });
                }
                // custom block
                _ => {}
            }

            pos = next;
        }

        Ok(parsed)
    }
}

fn parse_attrs(raw: &str) -> HashMap<String, Option<String>> {
    ATTR_RE
        .captures_iter(raw)
        .map(|cap| {
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| m.as_str().to_string());
            (cap[1].to_ascii_lowercase(), value)
        })
        .collect()
}

fn attr_value(attrs: &HashMap<String, Option<String>>, name: &str) -> Option<String> {
    attrs
        .get(name)
        .and_then(|v| v.clone())
        .filter(|v| !v.trim().is_empty())
}

fn reject_src(attrs: &HashMap<String, Option<String>>, tag: &str) -> Result<(), ParseFailure> {
    if attrs.contains_key("src") {
        Err(ParseFailure::ExternalSource(tag.to_string()))
    } else {
        Ok(())
    }
}

/// Finds `</tag ...>` after `from`. Returns (content end, close tag end).
fn find_raw_close(lower: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let needle = format!("</{}", tag);
    let mut search = from;

    while let Some(offset) = lower[search..].find(&needle) {
        let at = search + offset;
        let after = at + needle.len();
        if is_tag_boundary(lower, after) {
            let close = lower[after..].find('>')?;
            return Some((at, after + close + 1));
        }
        search = after;
    }
    None
}

/// Like [`find_raw_close`], but counts nested `<tag>` openings
fn find_balanced_close(lower: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);
    let mut depth = 1usize;
    let mut search = from;

    loop {
        let next_open = find_tag(lower, &open, search);
        let next_close = find_tag(lower, &close, search)?;

        match next_open {
            Some(o) if o < next_close => {
                let end = lower[o..].find('>')? + o;
                // self-closing `<template/>` does not nest
                if !lower[..end].ends_with('/') {
                    depth += 1;
                }
                search = end + 1;
            }
            _ => {
                depth -= 1;
                let end = lower[next_close..].find('>')? + next_close;
                if depth == 0 {
                    return Some((next_close, end + 1));
                }
                search = end + 1;
            }
        }
    }
}

fn find_tag(lower: &str, needle: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(offset) = lower[search..].find(needle) {
        let at = search + offset;
        if is_tag_boundary(lower, at + needle.len()) {
            return Some(at);
        }
        search = at + needle.len();
    }
    None
}

fn is_tag_boundary(lower: &str, at: usize) -> bool {
    match lower[at..].chars().next() {
        Some(c) => c == '>' || c == '/' || c.is_whitespace(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<ParsedSfc, ParseError> {
        BlockParser.parse(source, Path::new("src/demo-button/index.vue"))
    }

    #[test]
    fn parses_all_block_kinds() {
        let source = r#"<template>
  <button class="demo-button"><slot /></button>
</template>

<script lang="ts">
export default { name: 'demo-button' };
</script>

<style lang="less" scoped>
.demo-button { color: red; }
</style>
<style>
.global { margin: 0; }
</style>
"#;
        let parsed = parse(source).unwrap();

        let template = parsed.template.unwrap();
        assert!(template.content.contains("<button class=\"demo-button\">"));
        assert_eq!(template.lang, None);

        let script = parsed.script.unwrap();
        assert_eq!(script.lang(), "ts");
        assert!(script.content.contains("export default"));

        assert_eq!(parsed.styles.len(), 2);
        assert_eq!(parsed.styles[0].lang, "less");
        assert!(parsed.styles[0].scoped);
        assert_eq!(parsed.styles[1].lang, "css");
        assert!(!parsed.styles[1].scoped);
    }

    #[test]
    fn nested_templates_are_balanced() {
        let source = r#"<template>
  <list>
    <template #item="{ row }"><span>{{ row }}</span></template>
    <template v-slot:empty/>
  </list>
</template>
<script>export default {}</script>"#;
        let parsed = parse(source).unwrap();
        let template = parsed.template.unwrap();
        assert!(template.content.contains("<template #item"));
        assert!(template.content.contains("</list>"));
        assert!(parsed.script.is_some());
    }

    #[test]
    fn script_content_is_raw_text() {
        let source = "<script>\nconst html = '<template><div/></template>';\nexport default {}\n</script>";
        let parsed = parse(source).unwrap();
        assert!(parsed.template.is_none());
        assert!(parsed.script.unwrap().content.contains("<template><div/></template>"));
    }

    #[test]
    fn comments_and_custom_blocks_are_skipped() {
        let source = r#"<!-- <script>nope</script> -->
<docs>
# Button
</docs>
<script>export default {}</script>"#;
        let parsed = parse(source).unwrap();
        let script = parsed.script.unwrap();
        assert_eq!(script.content, "export default {}");
    }

    #[test]
    fn uppercase_tags_are_accepted() {
        let parsed = parse("<SCRIPT lang='ts'>export default {}</SCRIPT>").unwrap();
        assert_eq!(parsed.script.unwrap().lang.as_deref(), Some("ts"));
    }

    #[test]
    fn unclosed_block_fails() {
        let err = parse("<script>export default {}").unwrap_err();
        assert_eq!(err.reason, ParseFailure::UnclosedBlock("script".into()));
        assert!(err.path.contains("demo-button"));
    }

    #[test]
    fn duplicate_script_fails() {
        let err = parse("<script>a</script><script>b</script>").unwrap_err();
        assert_eq!(err.reason, ParseFailure::DuplicateBlock("script".into()));
    }

    #[test]
    fn script_setup_fails() {
        let err = parse("<script setup>const a = 1</script>").unwrap_err();
        assert_eq!(err.reason, ParseFailure::ScriptSetup);
    }

    #[test]
    fn external_src_fails() {
        let err = parse(r#"<style src="./theme.css"></style>"#).unwrap_err();
        assert_eq!(err.reason, ParseFailure::ExternalSource("style".into()));
    }

    #[test]
    fn component_name_from_index_file() {
        assert_eq!(component_name(Path::new("src/demo-button/index.vue")), "demo-button");
        assert_eq!(component_name(Path::new("src/demo-button/Item.vue")), "Item");
    }

    #[test]
    fn unit_keeps_scoped_flag() {
        let unit = ComponentUnit::parse(
            "src/demo-button/index.vue",
            "<script>export default {}</script><style scoped>.a{}</style>",
            &BlockParser,
        )
        .unwrap();
        assert_eq!(unit.name, "demo-button");
        assert!(unit.styles[0].scoped);
    }
}

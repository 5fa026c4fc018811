//! Scope IDs for scoped styles
//!
//! Format: `data-v-{8-char-hash}` (e.g., `data-v-7f2b4c1e`)
//!
//! The hash is the BLAKE3 digest of the unit's full source text, so the same
//! source always yields the same id, across runs and across machines.

use std::fmt;

use serde::Serialize;

use super::sfc::StyleBlock;

const PREFIX: &str = "data-v-";
const HASH_LEN: usize = 8;

/// Attribute-safe fingerprint tying scoped CSS to a component's markup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ScopeId {
    hash: String,
}

impl ScopeId {
    /// Computes the id for `source` unconditionally
    pub fn from_source(source: &str) -> Self {
        let hex = blake3::hash(source.as_bytes()).to_hex();
        Self {
            hash: hex[..HASH_LEN].to_string(),
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.hash)
    }
}

impl From<ScopeId> for String {
    fn from(id: ScopeId) -> Self {
        id.to_string()
    }
}

/// Returns the scope id for a unit, or `None` if no style block is scoped
pub fn scope_id(source: &str, styles: &[StyleBlock]) -> Option<ScopeId> {
    if styles.iter().any(|s| s.scoped) {
        Some(ScopeId::from_source(source))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn style(scoped: bool) -> StyleBlock {
        StyleBlock {
            content: ".a { color: red; }".into(),
            lang: "css".into(),
            scoped,
        }
    }

    #[test]
    fn absent_without_scoped_styles() {
        assert_eq!(scope_id("<template/>", &[]), None);
        assert_eq!(scope_id("<template/>", &[style(false), style(false)]), None);
    }

    #[test]
    fn present_when_any_style_is_scoped() {
        let id = scope_id("<template/>", &[style(false), style(true)]);
        assert!(id.is_some());
    }

    #[test]
    fn format_is_attribute_safe() {
        let id = ScopeId::from_source("<template><div/></template>").to_string();
        assert!(id.starts_with("data-v-"));
        assert_eq!(id.len(), "data-v-".len() + 8);
        assert!(id["data-v-".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn pinned_value_is_stable_across_processes() {
        // blake3("") = af1349b9...
        assert_eq!(ScopeId::from_source("").to_string(), "data-v-af1349b9");
    }

    #[test]
    fn different_sources_get_different_ids() {
        let a = ScopeId::from_source("<style scoped>.a{}</style>");
        let b = ScopeId::from_source("<style scoped>.b{}</style>");
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn identical_source_gives_identical_id(source in ".*") {
            let first = scope_id(&source, &[style(true)]);
            let second = scope_id(&source.clone(), &[style(true)]);
            prop_assert_eq!(first, second);
        }
    }
}

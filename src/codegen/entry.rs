//! Package entry module generation
//!
//! The generated module:
//! 1. imports every component (in sequence order)
//! 2. declares `version`
//! 3. declares `install(app)`, registering every component not skipped
//! 4. re-exports the components (grouped list, or `export *` per component)
//! 5. default-exports `{ install, version }`
//!
//! ## `install` contract
//!
//! Whether a component is a plugin or a plain component is only known at
//! runtime, so `install` checks each value: a value with an `install` method
//! is passed to `app.use`, a value with a `name` is passed to
//! `app.component(name, value)`, and anything else is skipped. Libraries mix
//! both shapes, so the skip is intentional.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::{resolve, CodegenError, PathResolver};
use crate::domain::naming::{is_valid_identifier, js_string, normalize_path, pascalize};

/// Options for [`generate_entry`]
#[derive(Default)]
pub struct EntryOptions {
    /// Re-export every symbol of each component module instead of a grouped list
    pub named_export: bool,
    /// Components left out of `install` (kebab or Pascal case)
    pub skip_install: Vec<String>,
    /// Rewrites each component's module path
    pub path_resolver: Option<PathResolver>,
    /// Embedded verbatim as the `version` export
    pub version: String,
    /// Directory holding one module directory per component
    pub src_dir: PathBuf,
}

struct Import {
    binding: String,
    path: String,
}

/// Generates the library entry module for `names`
pub fn generate_entry(names: &[String], options: &EntryOptions) -> Result<String, CodegenError> {
    let imports = resolve_imports(names, options)?;
    let skipped: HashSet<String> = options.skip_install.iter().map(|s| pascalize(s)).collect();

    let mut out = String::new();

    for import in &imports {
        if options.named_export {
            out.push_str(&format!("import {{ {} }} from '{}';\n", import.binding, import.path));
        } else {
            out.push_str(&format!("import {} from '{}';\n", import.binding, import.path));
        }
    }
    if !imports.is_empty() {
        out.push('\n');
    }

    out.push_str(&format!("const version = '{}';\n", js_string(&options.version)));
    out.push('\n');

    out.push_str("function install(app) {\n");
    out.push_str("  const components = [\n");
    for import in imports.iter().filter(|i| !skipped.contains(&i.binding)) {
        out.push_str(&format!("    {},\n", import.binding));
    }
    out.push_str("  ];\n");
    out.push('\n');
    out.push_str("  components.forEach(item => {\n");
    out.push_str("    if (item.install) {\n");
    out.push_str("      app.use(item);\n");
    out.push_str("    } else if (item.name) {\n");
    out.push_str("      app.component(item.name, item);\n");
    out.push_str("    }\n");
    out.push_str("  });\n");
    out.push_str("}\n");
    out.push('\n');

    out.push_str("export {\n");
    out.push_str("  install,\n");
    out.push_str("  version,\n");
    if !options.named_export {
        for import in &imports {
            out.push_str(&format!("  {},\n", import.binding));
        }
    }
    out.push_str("};\n");
    out.push('\n');

    if options.named_export && !imports.is_empty() {
        for import in &imports {
            out.push_str(&format!("export * from '{}';\n", import.path));
        }
        out.push('\n');
    }

    out.push_str("export default {\n");
    out.push_str("  install,\n");
    out.push_str("  version,\n");
    out.push_str("};\n");

    Ok(out)
}

/// Cases every name and resolves its module path, rejecting bad bindings
fn resolve_imports(names: &[String], options: &EntryOptions) -> Result<Vec<Import>, CodegenError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(names.len());
    let mut imports = Vec::with_capacity(names.len());

    for name in names {
        let binding = pascalize(name);

        if !is_valid_identifier(&binding) {
            return Err(CodegenError::InvalidIdentifier {
                name: name.clone(),
                binding,
            });
        }

        if let Some(first) = seen.insert(binding.clone(), name) {
            return Err(CodegenError::DuplicateBinding {
                binding,
                first: first.to_string(),
                second: name.clone(),
            });
        }

        let path = resolve(options.src_dir.join(name), options.path_resolver.as_ref());
        imports.push(Import {
            binding,
            path: js_string(&normalize_path(&path)),
        });
    }

    Ok(imports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn relative_options() -> EntryOptions {
        EntryOptions {
            version: "1.0.0".into(),
            src_dir: PathBuf::from("/lib/es"),
            path_resolver: Some(Box::new(|p: &Path| {
                Path::new(".").join(p.strip_prefix("/lib/es").unwrap_or(p))
            })),
            ..Default::default()
        }
    }

    fn index_of(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, haystack))
    }

    #[test]
    fn grouped_export_in_order() {
        let entry = generate_entry(&names(&["demo-button", "demo-list"]), &relative_options()).unwrap();

        let import_button = index_of(&entry, "import DemoButton from './demo-button';");
        let import_list = index_of(&entry, "import DemoList from './demo-list';");
        assert!(import_button < import_list);

        let install = index_of(&entry, "function install(app)");
        let install_button = install + index_of(&entry[install..], "    DemoButton,");
        let install_list = install + index_of(&entry[install..], "    DemoList,");
        assert!(install_button < install_list);

        assert!(entry.contains("export {\n  install,\n  version,\n  DemoButton,\n  DemoList,\n};"));
        assert!(entry.ends_with("export default {\n  install,\n  version,\n};\n"));
        assert!(entry.contains("const version = '1.0.0';"));
    }

    #[test]
    fn named_export_mode() {
        let options = EntryOptions {
            named_export: true,
            ..relative_options()
        };
        let entry = generate_entry(&names(&["demo-button"]), &options).unwrap();

        assert!(entry.contains("import { DemoButton } from './demo-button';"));
        assert!(entry.contains("export {\n  install,\n  version,\n};"));
        assert!(entry.contains("export * from './demo-button';"));
    }

    #[test]
    fn skip_install_still_imports_and_exports() {
        let options = EntryOptions {
            skip_install: vec!["lazyload".into()],
            ..relative_options()
        };
        let entry = generate_entry(&names(&["button", "lazyload"]), &options).unwrap();

        let install_start = index_of(&entry, "function install(app) {");
        let install_end = install_start + index_of(&entry[install_start..], "\n}\n");
        let install_body = &entry[install_start..install_end];

        assert!(install_body.contains("Button,"));
        assert!(!install_body.contains("Lazyload"));
        assert!(entry.contains("import Lazyload from './lazyload';"));
        assert!(entry.contains("  Lazyload,\n};"));
    }

    #[test]
    fn skip_install_accepts_pascal_case() {
        let options = EntryOptions {
            skip_install: vec!["ImagePreview".into()],
            ..relative_options()
        };
        let entry = generate_entry(&names(&["image-preview"]), &options).unwrap();
        assert!(entry.contains("  const components = [\n  ];"));
    }

    #[test]
    fn duplicate_bindings_rejected() {
        let err = generate_entry(&names(&["demo-button", "demo--button"]), &relative_options())
            .unwrap_err();
        assert_eq!(
            err,
            CodegenError::DuplicateBinding {
                binding: "DemoButton".into(),
                first: "demo-button".into(),
                second: "demo--button".into(),
            }
        );
    }

    #[test]
    fn invalid_identifier_rejected() {
        let err = generate_entry(&names(&["3d-card"]), &relative_options()).unwrap_err();
        assert!(matches!(err, CodegenError::InvalidIdentifier { .. }));
    }

    #[test]
    fn version_is_escaped() {
        let options = EntryOptions {
            version: "1.0.0-'beta'".into(),
            ..relative_options()
        };
        let entry = generate_entry(&[], &options).unwrap();
        assert!(entry.contains(r"const version = '1.0.0-\'beta\'';"));
    }

    #[test]
    fn without_resolver_uses_src_dir() {
        let options = EntryOptions {
            version: "0.1.0".into(),
            src_dir: PathBuf::from("src"),
            ..Default::default()
        };
        let entry = generate_entry(&names(&["button"]), &options).unwrap();
        assert!(entry.contains("import Button from 'src/button';"));
    }
}

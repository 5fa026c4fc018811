//! Output tree writes
//!
//! Generated files are written atomically (temp file + rename) and only when
//! their content changed, so watchers downstream do not see spurious events.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Directory names never copied into the output tree
pub const EXCLUDED_DIRS: &[&str] = &["demo", "test", "__test__", "__tests__"];

/// Writes `contents` to `path` unless it already holds exactly that
///
/// Returns true if the file was written.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == contents {
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, contents)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    // Atomic rename
    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(true)
}

/// Removes `dir` and everything under it, if present
pub fn clean_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clean directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Copies the tree under `from` into `to`, skipping [`EXCLUDED_DIRS`]
///
/// Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;

    let walker = WalkDir::new(from)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() > 0
                && entry.file_type().is_dir()
                && EXCLUDED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()))
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", from.display()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .with_context(|| format!("{} is outside {}", entry.path().display(), from.display()))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory: {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn writes_new_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("es").join("index.js");

        assert!(write_if_changed(&path, "export default {};\n").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "export default {};\n");
        assert!(!dir.path().join("es").join("index.js.tmp").exists());
    }

    #[test]
    fn unchanged_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.less");
        fs::write(&path, "@import \"a\";\n").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert!(!write_if_changed(&path, "@import \"a\";\n").unwrap());

        let after = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn changed_file_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.less");
        fs::write(&path, "old").unwrap();

        assert!(write_if_changed(&path, "new").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn copy_skips_excluded_dirs() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("button/demo")).unwrap();
        fs::create_dir_all(src.join("button/__tests__")).unwrap();
        fs::write(src.join("button/index.vue"), "<template/>").unwrap();
        fs::write(src.join("button/demo/index.vue"), "<template/>").unwrap();
        fs::write(src.join("button/__tests__/index.spec.js"), "").unwrap();

        let out = dir.path().join("es");
        let copied = copy_tree(&src, &out).unwrap();

        assert_eq!(copied, 1);
        assert!(out.join("button/index.vue").is_file());
        assert!(!out.join("button/demo").exists());
        assert!(!out.join("button/__tests__").exists());
    }

    #[test]
    fn clean_missing_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        clean_dir(&dir.path().join("missing")).unwrap();
    }
}

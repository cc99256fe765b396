//! Path helpers shared by the matcher, resolver and bundle writer.

use std::path::{Component, Path, PathBuf};

/// Render a path with forward slashes regardless of platform.
///
/// Rule patterns and module identities always use `/` so configurations
/// behave the same on Windows and Unix.
pub fn normalize_slashes(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::Normal(part) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&part.to_string_lossy());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str("..");
            }
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
        }
    }
    out
}

/// Module identity: the slash-normalized path relative to the project root.
///
/// Falls back to the full normalized path for files outside the root
/// (e.g. an absolute search root pointing elsewhere).
pub fn module_id(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    normalize_slashes(rel)
}

/// Lexically normalize a path: collapse `.` and `..` without touching the
/// filesystem. Used before existence checks so cache keys are canonical.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slashes_relative() {
        let path = Path::new("src").join("lib").join("app.js");
        assert_eq!(normalize_slashes(&path), "src/lib/app.js");
    }

    #[test]
    fn test_module_id_inside_root() {
        let root = Path::new("/proj");
        let path = Path::new("/proj/src/app.js");
        assert_eq!(module_id(path, root), "src/app.js");
    }

    #[test]
    fn test_module_id_outside_root() {
        let root = Path::new("/proj");
        let path = Path::new("/elsewhere/lib.js");
        assert_eq!(module_id(path, root), "/elsewhere/lib.js");
    }

    #[test]
    fn test_clean_collapses_dots() {
        assert_eq!(
            clean(Path::new("/proj/src/./sub/../app.js")),
            PathBuf::from("/proj/src/app.js")
        );
    }
}

//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Normalize a path, removing `.` components and folding `..` into the
/// preceding component.
///
/// Purely lexical: the filesystem is not consulted and symlinks are not
/// resolved. A `..` with nothing left to fold is kept for relative paths and
/// dropped at the root.
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let mut components = path.as_ref().components().peekable();
    let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().copied() {
        components.next();
        PathBuf::from(c.as_os_str())
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            Component::Prefix(..) => {}
            Component::RootDir => {
                ret.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => match ret.components().next_back() {
                Some(Component::Normal(_)) => {
                    ret.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(..)) => {}
                _ => ret.push(".."),
            },
            Component::Normal(c) => {
                ret.push(c);
            }
        }
    }
    if ret.as_os_str().is_empty() {
        ret.push(".");
    }
    ret
}

/// Join `relative` onto `base` and normalize the result.
pub fn resolve(base: &Path, relative: impl AsRef<Path>) -> PathBuf {
    normalize_path(base.join(normalize_path(relative)))
}

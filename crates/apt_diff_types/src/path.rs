//! Absolute filesystem paths as used throughout the dpkg state index.

use std::path::Path;
use std::path::PathBuf;

/// A path that is always absolute and always normalized: no `.`/`..`
/// components, no duplicate slashes, no trailing slash (other than the root
/// itself). Two paths that denote the same file always compare equal, since
/// comparisons throughout the dpkg state index are byte-for-byte on this
/// normalized form rather than anything path-aware.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AbsolutePath(PathBuf);

impl AbsolutePath {
    /// Build a normalized absolute path from a raw string such as a dpkg
    /// `.list` line (which also uses the literal `/.` for the package's root
    /// directory entry) or a `--path` argument.
    ///
    /// Splits on `/` and collapses away empty segments (duplicate or
    /// trailing slashes) and `.` segments; a `..` segment pops the preceding
    /// one rather than being kept literally, matching `os.path.normpath`.
    /// `..` above the root is simply dropped, since there is nothing left to
    /// pop.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let mut components: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    components.pop();
                }
                segment => components.push(segment),
            }
        }
        let mut normalized = PathBuf::from("/");
        normalized.extend(components);
        Self(normalized)
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Root-relative path components, suitable for walking a trie keyed by
    /// path segment.
    pub fn components(&self) -> impl Iterator<Item = &std::ffi::OsStr> {
        self.0.components().filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s),
            _ => None,
        })
    }
}

impl std::fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for AbsolutePath {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

impl AsRef<Path> for AbsolutePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_root_marker() {
        assert_eq!(AbsolutePath::new("/.").as_path(), Path::new("/"));
    }

    #[test]
    fn leaves_other_paths_untouched() {
        assert_eq!(
            AbsolutePath::new("/usr/bin/ls").as_path(),
            Path::new("/usr/bin/ls")
        );
    }

    #[test]
    fn components_skip_root() {
        let p = AbsolutePath::new("/usr/bin/ls");
        let comps: Vec<_> = p.components().map(|c| c.to_str().unwrap()).collect();
        assert_eq!(comps, vec!["usr", "bin", "ls"]);
    }

    #[test]
    fn collapses_duplicate_slashes() {
        assert_eq!(
            AbsolutePath::new("/usr//bin///ls"),
            AbsolutePath::new("/usr/bin/ls")
        );
    }

    #[test]
    fn drops_trailing_slash() {
        assert_eq!(
            AbsolutePath::new("/usr/bin/"),
            AbsolutePath::new("/usr/bin")
        );
    }

    #[test]
    fn collapses_dot_segments() {
        assert_eq!(
            AbsolutePath::new("/usr/./bin/./ls"),
            AbsolutePath::new("/usr/bin/ls")
        );
    }

    #[test]
    fn dotdot_pops_preceding_segment() {
        assert_eq!(
            AbsolutePath::new("/usr/bin/../lib/ls"),
            AbsolutePath::new("/usr/lib/ls")
        );
    }

    #[test]
    fn dotdot_above_root_is_dropped() {
        assert_eq!(AbsolutePath::new("/../etc"), AbsolutePath::new("/etc"));
    }
}

//! Minimal outermost-path filter used by `--path`/`-f` and by package
//! expansion (restricting traversal/fetching to only the paths a selection
//! of packages or explicit paths actually touch).

use std::path::Path;
use std::path::PathBuf;

/// A set of paths, reduced to only the outermost ones.
///
/// If both `/etc` and `/etc/foo` are added, `/etc/foo` is redundant (it is
/// already covered) and is dropped. Built once from a (possibly unsorted,
/// possibly redundant) list of paths, then queried many times during
/// traversal.
#[derive(Debug, Default, Clone)]
pub struct PathFilter {
    /// Sorted, duplicate-free, prefix-free list of root paths.
    roots: Vec<PathBuf>,
}

impl PathFilter {
    /// Build a filter from a list of paths, dropping any path that is
    /// already covered by another (shorter) path in the list.
    pub fn from_paths<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut sorted: Vec<PathBuf> = paths.into_iter().collect();
        sorted.sort();
        let mut roots: Vec<PathBuf> = Vec::with_capacity(sorted.len());
        for path in sorted {
            if !roots.iter().any(|root| is_prefix_of(root, &path)) {
                roots.push(path);
            }
        }
        Self { roots }
    }

    /// An empty filter has no roots at all, and therefore includes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether `path` is itself included (equal to, or a descendant of, one
    /// of the filter's roots). An empty filter includes nothing.
    #[must_use]
    pub fn includes(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| is_prefix_of(root, path))
    }

    /// Whether traversal should descend into `path` at all: either it is
    /// already included, or it could still be an ancestor of something that
    /// is (e.g. filter root `/etc/foo/bar` while traversal is at `/etc`). An
    /// empty filter includes nothing, so it never warrants descending.
    #[must_use]
    pub fn should_descend(&self, path: &Path) -> bool {
        self.roots
            .iter()
            .any(|root| is_prefix_of(root, path) || is_prefix_of(path, root))
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

fn is_prefix_of(prefix: &Path, path: &Path) -> bool {
    path.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drops_paths_covered_by_a_shorter_root() {
        let filter = PathFilter::from_paths([
            PathBuf::from("/etc"),
            PathBuf::from("/etc/passwd"),
            PathBuf::from("/usr/bin"),
        ]);
        assert_eq!(
            filter.roots(),
            &[PathBuf::from("/etc"), PathBuf::from("/usr/bin")]
        );
    }

    #[test]
    fn includes_descendants_of_roots_only() {
        let filter = PathFilter::from_paths([PathBuf::from("/etc")]);
        assert!(filter.includes(Path::new("/etc/passwd")));
        assert!(!filter.includes(Path::new("/usr/bin/ls")));
    }

    #[test]
    fn empty_filter_includes_nothing() {
        let filter = PathFilter::default();
        assert!(!filter.includes(Path::new("/anything")));
        assert!(!filter.should_descend(Path::new("/anything")));
    }

    #[test]
    fn descends_into_ancestors_of_a_deep_root() {
        let filter = PathFilter::from_paths([PathBuf::from("/etc/foo/bar")]);
        assert!(filter.should_descend(Path::new("/etc")));
        assert!(!filter.should_descend(Path::new("/usr")));
    }
}

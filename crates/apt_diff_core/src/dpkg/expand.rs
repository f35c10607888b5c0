//! `expand_package_to_leaf_paths`: reduce a package's `.list` to the minimal
//! set of paths that still covers everything it owns.

use super::list;
use apt_diff_types::path::AbsolutePath;
use std::io::BufReader;
use std::path::Path;

/// Read `pkg`'s `.list` file and reduce it to its leaf paths.
///
/// Missing `.list` files yield an empty result, matching the loader's own
/// failure semantics.
pub(crate) fn expand_package_to_leaf_paths(list_path: &Path, pkg: &str) -> Vec<AbsolutePath> {
    let file = match std::fs::File::open(list_path) {
        Ok(file) => file,
        Err(_) => return Vec::new(),
    };
    leaf_paths(list::parse_list(&mut BufReader::new(file), pkg))
}

/// Sort descending and keep a path iff the previously kept path does not
/// start with it, then reverse.
///
/// Descending order visits deeper paths before their ancestors, so "the
/// previously kept path starts with this one" means this one is an ancestor
/// of something already kept -- i.e. redundant. What survives is the set of
/// deepest paths, reversed back into ascending order.
fn leaf_paths(mut paths: Vec<AbsolutePath>) -> Vec<AbsolutePath> {
    paths.sort_by(|a, b| b.cmp(a));
    let mut kept: Vec<AbsolutePath> = Vec::with_capacity(paths.len());
    for path in paths {
        let redundant = kept
            .last()
            .is_some_and(|prev: &AbsolutePath| prev.as_path().starts_with(path.as_path()));
        if !redundant {
            kept.push(path);
        }
    }
    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(strs: &[&str]) -> Vec<AbsolutePath> {
        strs.iter().map(|s| AbsolutePath::new(s)).collect()
    }

    fn as_strings(paths: &[AbsolutePath]) -> Vec<String> {
        paths.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn drops_ancestor_directories() {
        let result = leaf_paths(paths(&["/", "/usr", "/usr/bin", "/usr/bin/hello"]));
        assert_eq!(as_strings(&result), vec!["/usr/bin/hello"]);
    }

    #[test]
    fn keeps_independent_branches() {
        let result = leaf_paths(paths(&[
            "/usr/bin/hello",
            "/usr/share/doc/hello/copyright",
            "/usr/share/doc/hello",
        ]));
        assert_eq!(
            as_strings(&result),
            vec!["/usr/bin/hello", "/usr/share/doc/hello/copyright"]
        );
    }

    #[test]
    fn missing_list_file_is_empty() {
        let result = expand_package_to_leaf_paths(Path::new("/nonexistent/pkg.list"), "pkg");
        assert!(result.is_empty());
    }
}

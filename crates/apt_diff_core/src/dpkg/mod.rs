//! The dpkg state index: a path-keyed trie built from `/var/lib/dpkg/info`.

mod conffiles;
mod expand;
mod list;
mod md5sums;

pub(crate) use expand::expand_package_to_leaf_paths;

use apt_diff_types::filter::PathFilter;
use apt_diff_types::intern::Interner;
use apt_diff_types::intern::PackageRef;
use apt_diff_types::package_info::ConffileStatus;
use apt_diff_types::path::AbsolutePath;
use apt_diff_types::trie::FilesystemNode;
use bstr::ByteVec;
use rayon::prelude::*;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

const DPKG_INFO_DIR: &str = "/var/lib/dpkg/info";

/// The immutable, fully-loaded dpkg state index: an interner plus the trie
/// it interns package names for.
///
/// Built once before traversal starts (see `crate::traversal`) and then
/// shared read-only across however many threads the pipeline spawns.
pub struct DpkgIndex {
    interner: Interner,
    root: FilesystemNode,
    /// Every package that has its own `.list` file, i.e. is actually
    /// installed (as opposed to merely mentioned by a stale `.md5sums`/
    /// conffile entry for a package that has since been removed).
    installed: std::collections::HashSet<PackageRef>,
}

impl DpkgIndex {
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    #[must_use]
    pub fn root(&self) -> &FilesystemNode {
        &self.root
    }

    #[must_use]
    pub fn is_installed(&self, pkg: PackageRef) -> bool {
        self.installed.contains(&pkg)
    }

    /// Read `pkg`'s `.list` file directly and reduce it to its leaf paths,
    /// without needing a built [`DpkgIndex`] first.
    ///
    /// Used to turn a `-p`/`--package` selection into traversal entry points
    /// before the filter (and therefore the index) is built.
    #[must_use]
    pub fn expand_package(pkg: &str) -> Vec<AbsolutePath> {
        let list_path = Path::new(DPKG_INFO_DIR).join(format!("{pkg}.list"));
        expand_package_to_leaf_paths(&list_path, pkg)
    }

    /// Walk the trie by `path`'s components. Returns `None` for a path the
    /// loader never saw (never called on a path the active filter excluded;
    /// doing so is a programmer error, not a reportable one).
    #[must_use]
    pub fn lookup(&self, path: &AbsolutePath) -> Option<&FilesystemNode> {
        let mut node = &self.root;
        for component in path.components() {
            let segment = component.to_str()?;
            node = node.get_child(segment)?;
        }
        Some(node)
    }

    /// Load every package's `.list`/`.md5sums`/conffile metadata, restricted
    /// to paths `filter` includes (an empty filter loads nothing).
    ///
    /// `conffile_packages` is forwarded verbatim to `dpkg-query -W`; an empty
    /// slice queries every installed package.
    pub fn build(
        filter: &PathFilter,
        conffile_packages: &[impl AsRef<str>],
    ) -> eyre::Result<Self> {
        let interner = Interner::new();
        let mut root = FilesystemNode::default();
        let mut installed = std::collections::HashSet::new();

        let list_files = dpkg_info_files("list")?;
        let loaded: Vec<(String, Vec<AbsolutePath>)> = list_files
            .into_par_iter()
            .map(|(pkg, path)| (pkg.clone(), load_list(&path, &pkg)))
            .collect();
        for (pkg, paths) in loaded {
            let pkg_ref = PackageRef::get_or_intern(&interner, &pkg);
            installed.insert(pkg_ref);
            for path in paths {
                if filter.includes(path.as_path()) {
                    insert_owner(&mut root, &path, pkg_ref);
                }
            }
        }

        let md5sums_files = dpkg_info_files("md5sums")?;
        let loaded: Vec<(String, Vec<md5sums::Md5SumEntry>)> = md5sums_files
            .into_par_iter()
            .map(|(pkg, path)| (pkg.clone(), load_md5sums(&path, &pkg)))
            .collect();
        for (pkg, entries) in loaded {
            let pkg_ref = PackageRef::get_or_intern(&interner, &pkg);
            for entry in entries {
                if !filter.includes(entry.path.as_path()) {
                    continue;
                }
                let node = node_for(&mut root, &entry.path);
                let info = node.ensure_package_info(pkg_ref);
                if info.md5sum.replace(entry.hash).is_some() {
                    tracing::warn!(
                        "duplicate .md5sums entry for {} owned by {pkg}",
                        entry.path
                    );
                }
            }
        }

        for entry in conffiles::get_conffiles(conffile_packages)? {
            if !filter.includes(entry.path.as_path()) {
                continue;
            }
            let Some(node) = lookup_mut(&mut root, &entry.path) else {
                tracing::warn!(
                    "conffile {} is not owned by any package's .list",
                    entry.path
                );
                continue;
            };
            let Some(pkg_ref) = node.primary_owner() else {
                tracing::warn!("conffile {} has no owning package", entry.path);
                continue;
            };
            let info = node.ensure_package_info(pkg_ref);
            if info
                .conffile
                .replace(ConffileStatus {
                    hash: entry.hash,
                    obsolete: entry.obsolete,
                })
                .is_some()
            {
                tracing::warn!("duplicate Conffiles entry for {}", entry.path);
            }
        }

        Ok(Self {
            interner,
            root,
            installed,
        })
    }
}

fn load_list(path: &Path, pkg: &str) -> Vec<AbsolutePath> {
    match std::fs::File::open(path) {
        Ok(file) => list::parse_list(&mut BufReader::new(file), pkg),
        Err(err) => {
            tracing::warn!("failed to open {}: {err}", path.display());
            Vec::new()
        }
    }
}

fn load_md5sums(path: &Path, pkg: &str) -> Vec<md5sums::Md5SumEntry> {
    match std::fs::File::open(path) {
        Ok(file) => md5sums::parse_md5sums(&mut BufReader::new(file), pkg),
        Err(err) => {
            tracing::warn!("failed to open {}: {err}", path.display());
            Vec::new()
        }
    }
}

/// List `<pkgname>.<ext>` files in the dpkg info directory, paired with the
/// package name extracted from the filename.
fn dpkg_info_files(ext: &str) -> eyre::Result<Vec<(String, PathBuf)>> {
    let suffix = format!(".{ext}");
    let mut result = Vec::new();
    let entries = match std::fs::read_dir(DPKG_INFO_DIR) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("failed to read {DPKG_INFO_DIR}: {err}");
            return Ok(result);
        }
    };
    for entry in entries {
        let entry = entry?;
        let Ok(file_name) = <Vec<u8> as ByteVec>::from_os_string(entry.file_name()) else {
            tracing::warn!("non-UTF8 file name in {DPKG_INFO_DIR}: {:?}", entry.file_name());
            continue;
        };
        let Ok(file_name) = String::from_utf8(file_name) else {
            tracing::warn!("non-UTF8 file name in {DPKG_INFO_DIR}: {:?}", entry.file_name());
            continue;
        };
        if let Some(pkg) = file_name.strip_suffix(&suffix) {
            result.push((pkg.to_owned(), entry.path()));
        }
    }
    Ok(result)
}

/// Record `pkg` as an owner of every component on the path from the root
/// down to `path`'s final segment.
fn insert_owner(root: &mut FilesystemNode, path: &AbsolutePath, pkg: PackageRef) {
    let mut node = root;
    node.add_owner(pkg);
    for component in path.components() {
        node = node.child_or_insert(&component.to_string_lossy());
        node.add_owner(pkg);
    }
}

/// Get or create the node for `path`, without recording any ownership (used
/// when a later metadata pass mentions a path the `.list` pass already
/// created the node for).
fn node_for<'r>(root: &'r mut FilesystemNode, path: &AbsolutePath) -> &'r mut FilesystemNode {
    let mut node = root;
    for component in path.components() {
        node = node.child_or_insert(&component.to_string_lossy());
    }
    node
}

/// Like [`node_for`], but does not create missing nodes: conffile/md5sums
/// entries for paths the `.list` pass never saw are stale metadata, not
/// something to manufacture a trie entry for.
fn lookup_mut<'r>(
    root: &'r mut FilesystemNode,
    path: &AbsolutePath,
) -> Option<&'r mut FilesystemNode> {
    let mut node = root;
    for component in path.components() {
        node = node.get_child_mut(&component.to_string_lossy())?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apt_diff_types::intern::Interner;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_owner_records_every_ancestor() {
        let interner = Interner::new();
        let pkg = PackageRef::get_or_intern(&interner, "hello");
        let mut root = FilesystemNode::default();
        insert_owner(&mut root, &AbsolutePath::new("/usr/bin/hello"), pkg);
        assert!(root.owners().contains(&pkg));
        let usr = root.get_child("usr").unwrap();
        assert!(usr.owners().contains(&pkg));
        let bin = usr.get_child("bin").unwrap();
        assert!(bin.owners().contains(&pkg));
        let hello = bin.get_child("hello").unwrap();
        assert!(hello.owners().contains(&pkg));
    }

    #[test]
    fn lookup_mut_does_not_manufacture_nodes() {
        let mut root = FilesystemNode::default();
        assert!(lookup_mut(&mut root, &AbsolutePath::new("/etc/foo")).is_none());
    }
}

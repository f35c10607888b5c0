//! The path-keyed trie that represents everything dpkg expects to exist.
//!
//! Built once from every installed package's `.list`/`.md5sums`/conffile
//! metadata (see `apt_diff_core::dpkg`), then walked in lockstep with the
//! real filesystem by the traversal driver.

use crate::intern::PackageRef;
use crate::package_info::PackageInfo;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// One node of the dpkg state trie.
///
/// A node with children is an expected directory. A node with per-package
/// info but no children is an expected regular file (or conffile). A node
/// with both is a conflict: something a package claims as a plain file
/// shares a path with something (possibly the same package, possibly
/// another) that claims it as a directory -- see the directory/symlink
/// conflict scenario.
#[derive(Debug, Default)]
pub struct FilesystemNode {
    /// Packages that claim ownership of this path, in the order they were
    /// first recorded. When more than one package owns an otherwise
    /// identical leaf, the first one recorded is treated as canonical.
    owners: SmallVec<[PackageRef; 1]>,
    children: BTreeMap<CompactString, FilesystemNode>,
    /// Per-owner facts, present only for paths with `.md5sums`/conffile
    /// entries (i.e. plain files dpkg can verify the contents of).
    package_info: HashMap<PackageRef, PackageInfo>,
}

impl FilesystemNode {
    /// Record `pkg` as an owner of this path, without it becoming a
    /// checkable leaf (used for intermediate directory components).
    pub fn add_owner(&mut self, pkg: PackageRef) {
        if !self.owners.contains(&pkg) {
            self.owners.push(pkg);
        }
    }

    /// Record that `pkg` ships this path as a checkable leaf, with the given
    /// per-package info.
    pub fn set_package_info(&mut self, pkg: PackageRef, info: PackageInfo) {
        self.add_owner(pkg);
        self.package_info.insert(pkg, info);
    }

    /// Get or create `pkg`'s per-package info without recording it as an
    /// owner.
    ///
    /// `.md5sums` and conffile data are loaded as separate passes after the
    /// `.list` pass that populates `owners`; either pass may be the first to
    /// mention a given `(path, package)` pair, and either may mention a
    /// package that turns out to own nothing in this path's `.list` at all
    /// (stale metadata). Use this to merge fields in from both passes
    /// without manufacturing a bogus ownership record; callers that discover
    /// a new owner call [`Self::add_owner`] explicitly.
    pub fn ensure_package_info(&mut self, pkg: PackageRef) -> &mut PackageInfo {
        self.package_info.entry(pkg).or_default()
    }

    /// Get or create the child named `segment`.
    pub fn child_or_insert(&mut self, segment: &str) -> &mut Self {
        self.children
            .entry(CompactString::from(segment))
            .or_default()
    }

    #[must_use]
    pub fn get_child(&self, segment: &str) -> Option<&Self> {
        self.children.get(segment)
    }

    #[must_use]
    pub fn get_child_mut(&mut self, segment: &str) -> Option<&mut Self> {
        self.children.get_mut(segment)
    }

    #[must_use]
    pub fn children(&self) -> &BTreeMap<CompactString, Self> {
        &self.children
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True if any package records this path as a checkable leaf.
    #[must_use]
    pub fn expects_file(&self) -> bool {
        !self.package_info.is_empty()
    }

    #[must_use]
    pub fn owners(&self) -> &[PackageRef] {
        &self.owners
    }

    /// The owner used for reporting and fetch dispatch when more than one
    /// package owns this path (first one recorded wins).
    #[must_use]
    pub fn primary_owner(&self) -> Option<PackageRef> {
        self.owners.first().copied()
    }

    #[must_use]
    pub fn package_info(&self, pkg: PackageRef) -> Option<&PackageInfo> {
        self.package_info.get(&pkg)
    }

    pub fn package_infos(&self) -> impl Iterator<Item = (&PackageRef, &PackageInfo)> {
        self.package_info.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;
    use pretty_assertions::assert_eq;

    #[test]
    fn directory_then_file_conflict_is_visible() {
        let interner = Interner::new();
        let pkg = PackageRef::get_or_intern(&interner, "coreutils");
        let mut root = FilesystemNode::default();
        let usr = root.child_or_insert("usr");
        usr.add_owner(pkg);
        let bin = usr.child_or_insert("bin");
        bin.set_package_info(pkg, PackageInfo::default());

        let bin = root.get_child("usr").unwrap().get_child("bin").unwrap();
        assert!(bin.expects_file());
        assert!(!bin.has_children());
    }

    #[test]
    fn first_owner_recorded_is_primary() {
        let interner = Interner::new();
        let a = PackageRef::get_or_intern(&interner, "a");
        let b = PackageRef::get_or_intern(&interner, "b");
        let mut node = FilesystemNode::default();
        node.add_owner(a);
        node.add_owner(b);
        assert_eq!(node.primary_owner(), Some(a));
    }
}

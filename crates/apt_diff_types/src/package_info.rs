//! Per-(path, package) facts recorded by the dpkg state index.

use crate::hash::Hash;

/// What dpkg knows about one path as shipped by one package.
///
/// A leaf in the filesystem trie can be owned by more than one package (see
/// [`crate::trie::FilesystemNode`]); each owner gets its own `PackageInfo` so
/// conffile status from one package never leaks into another's.
#[derive(Debug, Clone, Default, derive_builder::Builder)]
#[builder(default)]
pub struct PackageInfo {
    /// Expected MD5 from the package's `.md5sums` file, if it has one.
    ///
    /// Conffiles and a handful of other paths (devices, maintainer scripts)
    /// have no `.md5sums` entry; such paths are checked for existence only.
    pub md5sum: Option<Hash>,
    /// Conffile status from `dpkg-query -f '${Conffiles}'`, if this path is a
    /// conffile of this package.
    pub conffile: Option<ConffileStatus>,
}

impl PackageInfo {
    #[must_use]
    pub fn builder() -> PackageInfoBuilder {
        PackageInfoBuilder::default()
    }
}

/// Conffile status for one (path, package) pair.
///
/// The `newconffile` placeholder dpkg emits for a conffile registered but
/// not yet installed carries no usable hash; that line is warned-and-dropped
/// by the parser (see `apt_diff_core::dpkg::conffiles`), so every
/// `ConffileStatus` that reaches the trie has a real recorded hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConffileStatus {
    /// Hash dpkg has on record for this conffile (its last-known-good
    /// contents, not necessarily what is shipped in the archive).
    pub hash: Hash,
    /// Whether dpkg reports this as an obsolete conffile (still tracked, but
    /// no longer shipped by any installed version of the package).
    pub obsolete: bool,
}

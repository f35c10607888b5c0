//! The filesystem traversal state machine.
//!
//! Walks the on-disk tree and the dpkg trie in lockstep, classifying each
//! node and either emitting a hash-check record, a hash-less fetch record,
//! or a textual report line. Grounded closely on
//! `original_source/apt_diff/apt_diff.py`'s `__do_check`/`__check_file`
//! methods, generalized per spec §4.2's dedup-by-hash rule (the original
//! simply refuses to check a file owned by more than one package; the
//! hash-dedup behaviour here is a deliberate improvement pinned in
//! `DESIGN.md`'s Open Question 1).

use crate::dpkg::DpkgIndex;
use crate::report::lock_report;
use crate::report::Report;
use crate::PipelineConfig;
use apt_diff_types::hash::Hash;
use apt_diff_types::intern::Interner;
use apt_diff_types::intern::PackageRef;
use apt_diff_types::path::AbsolutePath;
use apt_diff_types::pipeline::FetchRecord;
use apt_diff_types::pipeline::HashCheckRecord;
use apt_diff_types::report::Discrepancy;
use apt_diff_types::report::DiscrepancyKind;
use apt_diff_types::report::EntryType;
use apt_diff_types::trie::FilesystemNode;
use itertools::Itertools;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

/// Drives one run's worth of `--path`/`--package` checks against a built
/// [`DpkgIndex`], feeding the hash-verifier and fetcher-bypass channels of a
/// running pipeline.
pub struct Traversal<'a> {
    index: &'a DpkgIndex,
    config: &'a PipelineConfig,
    report: &'a Mutex<Report>,
    hash_check: &'a flume::Sender<HashCheckRecord>,
    bypass: &'a flume::Sender<FetchRecord>,
}

impl<'a> Traversal<'a> {
    #[must_use]
    pub fn new(
        index: &'a DpkgIndex,
        config: &'a PipelineConfig,
        report: &'a Mutex<Report>,
        hash_check: &'a flume::Sender<HashCheckRecord>,
        bypass: &'a flume::Sender<FetchRecord>,
    ) -> Self {
        Self {
            index,
            config,
            report,
            hash_check,
            bypass,
        }
    }

    /// Check one explicit `--path`/`-f` argument (already normalized).
    ///
    /// Extras are reported (subject to `--no-ignore-extras`) anywhere under
    /// this path, since the user asked to check the real tree rooted here.
    pub fn check_path(&self, path: &Path) {
        let node = self.index.lookup(&AbsolutePath::from(path.to_path_buf()));
        self.check(path, node, None, false, true);
    }

    /// Check one explicit `--package`/`-p` argument.
    ///
    /// Recurses from each of the package's own leaf paths rather than from
    /// `/`: the dpkg index was only populated for paths the active
    /// [`crate::config::PipelineConfig`] selection touches, so starting
    /// anywhere else would see unrelated, unloaded paths as spurious
    /// "extra" files. Extras are therefore never reported while walking a
    /// package (matching the original's `check_extras=False` for
    /// package-initiated checks).
    pub fn check_package(&self, pkg: &str) {
        let leaves = DpkgIndex::expand_package(pkg);
        if leaves.is_empty() {
            println!("Package {pkg} does not own any installed paths");
            return;
        }
        for leaf in leaves {
            let node = self.index.lookup(&leaf);
            self.check(leaf.as_path(), node, None, false, false);
        }
    }

    fn interner(&self) -> &Interner {
        self.index.interner()
    }

    fn check(
        &self,
        path: &Path,
        node: Option<&FilesystemNode>,
        parent: Option<&FilesystemNode>,
        within_symlink: bool,
        check_extras: bool,
    ) {
        let lstat = std::fs::symlink_metadata(path);
        let lexists = lstat.is_ok();
        let stat = std::fs::metadata(path);
        let exists = stat.is_ok();
        let islink = lstat
            .as_ref()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        let isdir = stat.as_ref().map(std::fs::Metadata::is_dir).unwrap_or(false);
        let isfile = stat.as_ref().map(std::fs::Metadata::is_file).unwrap_or(false);

        match (node, lexists) {
            (Some(node), false) => {
                lock_report(self.report).discrepancy(
                    &Discrepancy::new(
                        display_path(path, false),
                        node.primary_owner(),
                        DiscrepancyKind::Missing,
                    ),
                    self.interner(),
                );
            }
            (None, true) => {
                if within_symlink || !check_extras {
                    return;
                }
                if !self.config.report_extras {
                    lock_report(self.report).ignored_extra();
                    return;
                }
                lock_report(self.report).discrepancy(
                    &Discrepancy::new(
                        display_path(path, isdir),
                        parent.and_then(FilesystemNode::primary_owner),
                        DiscrepancyKind::Extra,
                    ),
                    self.interner(),
                );
            }
            (None, false) => {
                println!(
                    "{}: not found in filesystem nor in any package",
                    path.display()
                );
            }
            (Some(node), true) => {
                self.check_present(path, node, within_symlink, check_extras, exists, isdir, isfile, islink);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn check_present(
        &self,
        path: &Path,
        node: &FilesystemNode,
        within_symlink: bool,
        check_extras: bool,
        exists: bool,
        isdir: bool,
        isfile: bool,
        islink: bool,
    ) {
        let expect_dir = node.has_children();
        let expect_file = node.expects_file();
        if expect_dir && expect_file {
            tracing::warn!(
                "{} is recorded as both an expected file and an expected directory; treating as a directory",
                path.display()
            );
        }

        if expect_dir {
            self.check_expected_dir(path, node, within_symlink, check_extras, isdir, islink);
            return;
        }
        if expect_file {
            self.check_expected_file(path, node, exists, isdir, isfile, islink);
            return;
        }

        // Neither: dpkg lists this path but has no content hash and no
        // children for it (an empty directory, a symlink, or a leaf dpkg
        // never recorded a `.md5sums`/conffile entry for).
        if islink {
            lock_report(self.report).unverifiable_link();
            if self.config.report_unverifiable {
                println!(
                    "{}: skipping unverifiable symbolic link (owned by {})",
                    path.display(),
                    owner_name(node, self.interner())
                );
            }
        } else if isdir {
            lock_report(self.report).unverifiable_dir();
            if self.config.report_unverifiable {
                println!(
                    "{}: skipping unverifiable directory (owned by {})",
                    path.display(),
                    owner_name(node, self.interner())
                );
            }
        } else if isfile {
            self.check_file(path, node);
        } else {
            tracing::warn!(
                "special file installed at {} (owned by {})",
                path.display(),
                owner_name(node, self.interner())
            );
        }
    }

    fn check_expected_dir(
        &self,
        path: &Path,
        node: &FilesystemNode,
        within_symlink: bool,
        check_extras: bool,
        isdir: bool,
        islink: bool,
    ) {
        if !isdir {
            lock_report(self.report).discrepancy(
                &Discrepancy::new(
                    path.to_path_buf(),
                    node.primary_owner(),
                    DiscrepancyKind::TypeConflict {
                        expected: EntryType::Directory,
                        actual: real_entry_type(path),
                    },
                ),
                self.interner(),
            );
            return;
        }

        let mut within_symlink = within_symlink;
        if islink {
            tracing::warn!(
                "package content installed under {} crosses unexpected symlink",
                path.display()
            );
            within_symlink = true;
        }
        self.recurse_into_dir(path, node, within_symlink, check_extras);
    }

    fn recurse_into_dir(
        &self,
        path: &Path,
        node: &FilesystemNode,
        within_symlink: bool,
        check_extras: bool,
    ) {
        let mut on_disk = Vec::new();
        match std::fs::read_dir(path) {
            Ok(entries) => {
                for entry in entries {
                    match entry {
                        Ok(entry) => match entry.file_name().into_string() {
                            Ok(name) => on_disk.push(name),
                            Err(raw) => {
                                tracing::warn!(
                                    "skipping non-UTF8 entry {raw:?} under {}",
                                    path.display()
                                );
                            }
                        },
                        Err(err) => {
                            lock_report(self.report)
                                .io_error(format!("error reading an entry of {}: {err}", path.display()));
                        }
                    }
                }
            }
            Err(err) => {
                lock_report(self.report).io_error(format!("can't list {}: {err}", path.display()));
                return;
            }
        }
        on_disk.sort_unstable();
        let owned: Vec<String> = node.children().keys().map(ToString::to_string).collect();

        for name in on_disk.into_iter().merge(owned).dedup() {
            let child_node = node.get_child(&name);
            self.check(&path.join(&name), child_node, Some(node), within_symlink, check_extras);
        }
    }

    fn check_expected_file(
        &self,
        path: &Path,
        node: &FilesystemNode,
        exists: bool,
        isdir: bool,
        isfile: bool,
        islink: bool,
    ) {
        if islink {
            let kind = if !exists {
                Some(DiscrepancyKind::BrokenSymlinkExpectedFile)
            } else if isdir {
                Some(DiscrepancyKind::SymlinkedDirectoryExpectedFile)
            } else if isfile {
                tracing::warn!(
                    "{} is an unexpected symlink to a regular file (owned by {})",
                    path.display(),
                    owner_name(node, self.interner())
                );
                self.check_file(path, node);
                None
            } else {
                Some(DiscrepancyKind::SymlinkedSpecialExpectedFile)
            };
            if let Some(kind) = kind {
                lock_report(self.report).discrepancy(
                    &Discrepancy::new(path.to_path_buf(), node.primary_owner(), kind),
                    self.interner(),
                );
            }
            return;
        }

        if isfile {
            self.check_file(path, node);
        } else {
            let actual = if isdir { EntryType::Directory } else { real_entry_type(path) };
            lock_report(self.report).discrepancy(
                &Discrepancy::new(
                    path.to_path_buf(),
                    node.primary_owner(),
                    DiscrepancyKind::TypeConflict {
                        expected: EntryType::RegularFile,
                        actual,
                    },
                ),
                self.interner(),
            );
        }
    }

    /// Content-check a regular file: read permission, conffile handling,
    /// hash dedup across owners, and dispatch to the hash verifier or the
    /// fetcher bypass stream.
    fn check_file(&self, path: &Path, node: &FilesystemNode) {
        if let Err(err) = std::fs::File::open(path) {
            lock_report(self.report).io_error(format!("can't read {}: {err}", path.display()));
            return;
        }

        if self.config.ignore_conffiles
            && node
                .package_infos()
                .any(|(_, info)| info.conffile.is_some())
        {
            lock_report(self.report).ignored_conffile();
            return;
        }

        let interner = self.interner();
        let mut hash_groups: HashMap<Hash, Vec<PackageRef>> = HashMap::new();
        let mut no_hash: Vec<PackageRef> = Vec::new();

        for &pkg in node.owners() {
            let Some(info) = node.package_info(pkg) else {
                no_hash.push(pkg);
                continue;
            };
            if let Some(conffile) = &info.conffile {
                if conffile.obsolete {
                    lock_report(self.report)
                        .obsolete_conffile_skipped(path, pkg.to_str(interner));
                    continue;
                }
                if let Some(md5) = info.md5sum {
                    if md5 != conffile.hash {
                        tracing::warn!(
                            "md5sum and conffile status disagree for {} ({})",
                            path.display(),
                            pkg.to_str(interner)
                        );
                    }
                }
            }
            let hash = info
                .md5sum
                .or_else(|| info.conffile.as_ref().map(|c| c.hash));
            match hash {
                Some(hash) => hash_groups.entry(hash).or_default().push(pkg),
                None => no_hash.push(pkg),
            }
        }

        // Stale `package_info` entries for packages that don't own this
        // path at all (the `.md5sums`/`Conffiles` pass mentioned a package
        // the `.list` pass never recorded as an owner here).
        for (&pkg, info) in node.package_infos() {
            if node.owners().contains(&pkg) {
                continue;
            }
            let obsolete = info.conffile.as_ref().is_some_and(|c| c.obsolete);
            if obsolete || !self.index.is_installed(pkg) {
                continue;
            }
            tracing::warn!(
                "{} has stale package_info for {}, which does not own it",
                path.display(),
                pkg.to_str(interner)
            );
            if let Some(hash) = info
                .md5sum
                .or_else(|| info.conffile.as_ref().map(|c| c.hash))
            {
                hash_groups.entry(hash).or_default().push(pkg);
            }
        }

        if hash_groups.len() > 1 {
            tracing::warn!("conflicting hashes recorded for {}", path.display());
        }

        for (hash, pkgs) in &hash_groups {
            // Open Question 1 (DESIGN.md): arbitrary pick among owners
            // sharing an identical hash, first one recorded wins.
            let record = HashCheckRecord {
                pkg: pkgs[0],
                hash: *hash,
                path: path.to_path_buf(),
            };
            if self.hash_check.send(record).is_err() {
                tracing::error!("hash verifier channel closed early");
            }
        }
        for pkg in no_hash {
            let record = FetchRecord {
                pkg,
                path: path.to_path_buf(),
            };
            if self.bypass.send(record).is_err() {
                tracing::error!("fetcher bypass channel closed early");
            }
        }
    }
}

fn owner_name<'i>(node: &FilesystemNode, interner: &'i Interner) -> &'i str {
    node.primary_owner()
        .map_or("<unknown>", |pkg| pkg.to_str(interner))
}

fn real_entry_type(path: &Path) -> EntryType {
    std::fs::symlink_metadata(path)
        .map(|meta| EntryType::from(meta.file_type()))
        .unwrap_or(EntryType::Other)
}

/// Append a trailing `/` to a directory's displayed path so the report
/// output can tell files and directories apart.
fn display_path(path: &Path, isdir: bool) -> PathBuf {
    if !isdir || path.to_string_lossy().ends_with('/') {
        return path.to_path_buf();
    }
    let mut raw = path.as_os_str().to_owned();
    raw.push("/");
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_path_adds_trailing_slash_for_dirs() {
        assert_eq!(display_path(Path::new("/etc"), true), PathBuf::from("/etc/"));
        assert_eq!(display_path(Path::new("/etc/passwd"), false), PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn display_path_does_not_double_up_slash() {
        assert_eq!(display_path(Path::new("/"), true), PathBuf::from("/"));
    }
}

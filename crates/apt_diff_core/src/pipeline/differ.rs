//! Differ stage: extracts each package's archive once, then diffs every
//! file the fetcher routed to it against the on-disk copy.
//!
//! Grounded closely on `original_source/differ_process.py`'s `create`
//! closure: extract on `first_of_package`, check the file actually exists
//! in the extracted tree (a locally-repackaged or third-party-repo version
//! of a package can ship a different file set than what's installed), diff
//! it if so, and return the running discrepancy count once the input
//! channel closes (the in-process equivalent of writing the final count to
//! the pipe on EOF).

use crate::difftool::DiffTool;
use crate::extract::ArchiveExtractor;
use crate::report::lock_report;
use crate::report::Report;
use apt_diff_types::intern::Interner;
use apt_diff_types::intern::PackageRef;
use apt_diff_types::pipeline::DifferRecord;
use std::collections::HashSet;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

pub(super) fn run(
    input: flume::Receiver<DifferRecord>,
    interner: &Interner,
    extraction_root: &Path,
    extractor: &dyn ArchiveExtractor,
    difftool: &dyn DiffTool,
    report: &Mutex<Report>,
) -> usize {
    let mut extracted: HashSet<PackageRef> = HashSet::new();
    let mut discrepancies = 0usize;

    for record in input.iter() {
        let pkg_name = record.pkg.to_str(interner);
        let pkg_dir = extraction_root.join(pkg_name);

        if extracted.insert(record.pkg) {
            if !record.first_of_package {
                tracing::warn!(
                    "extracting {pkg_name} without a first-of-package marker (pipeline invariant violation)"
                );
            }
            if let Err(err) = extractor.extract(&record.archive_path, &pkg_dir) {
                lock_report(report).extract_failed(pkg_name, &err);
                continue;
            }
        } else if record.first_of_package {
            tracing::warn!(
                "duplicate first-of-package marker for {pkg_name} (pipeline invariant violation)"
            );
        }

        let extracted_file = join_under(&pkg_dir, &record.path);
        if std::fs::symlink_metadata(&extracted_file).is_err() {
            println!(
                "{}: owned but missing from the {pkg_name} archive",
                record.path.display()
            );
            discrepancies += 1;
            continue;
        }

        match difftool.diff(&extracted_file, &record.path) {
            Ok(true) => discrepancies += 1,
            Ok(false) => {}
            Err(err) => lock_report(report).diff_failed(pkg_name, &record.path, &err),
        }
    }

    discrepancies
}

/// `<pkg_dir>/<path's normal components>`, i.e. `path` re-rooted under the
/// package's extraction directory rather than treated as a relative
/// filesystem path, matching `differ_process.py`'s `extract_path + filename`
/// string join.
fn join_under(pkg_dir: &Path, path: &Path) -> PathBuf {
    let mut result = pkg_dir.to_path_buf();
    for component in path.components() {
        if let Component::Normal(part) = component {
            result.push(part);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn join_under_reroots_the_absolute_path() {
        let joined = join_under(Path::new("/tmp/extracted/hello"), Path::new("/usr/bin/hello"));
        assert_eq!(joined, Path::new("/tmp/extracted/hello/usr/bin/hello"));
    }
}

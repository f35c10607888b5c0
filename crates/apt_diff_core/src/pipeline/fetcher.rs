//! Fetcher stage: resolves `(pkg, path)` records to archive paths,
//! acquiring each package's archive at most once.
//!
//! Grounded on `original_source/apt_fetcher_process.py`'s `AptFetcher`
//! (`__pkg_paths` cache keyed by package name, `first = "T"` exactly once
//! per package). That process merged its two input pipes (hash mismatches,
//! no-hash bypass) with a `pollingtools.Poller`; a `flume::Selector` looked
//! like the direct port of that, but mapping a permanently-closed channel's
//! `Err` to "not ready" inside a selector callback risks spinning forever
//! once one side closes for good. Two small forwarder threads draining each
//! source into one shared channel avoid that: each is single-threaded over
//! its own source (so per-stream order is preserved) and neither can block
//! the other from making progress.

use crate::acquire::ArchiveAcquirer;
use crate::report::lock_report;
use crate::report::Report;
use apt_diff_types::intern::Interner;
use apt_diff_types::intern::PackageRef;
use apt_diff_types::pipeline::DifferRecord;
use apt_diff_types::pipeline::FetchRecord;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::thread::Scope;

pub(super) fn spawn<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    mismatches: flume::Receiver<FetchRecord>,
    bypass: flume::Receiver<FetchRecord>,
    interner: &'scope Interner,
    acquirer: &'scope (dyn ArchiveAcquirer + 'scope),
    report: &'scope Mutex<Report>,
) -> flume::Receiver<DifferRecord> {
    let (merged_tx, merged_rx) = flume::unbounded();
    for source in [mismatches, bypass] {
        let merged_tx = merged_tx.clone();
        scope.spawn(move || {
            for record in source.iter() {
                if merged_tx.send(record).is_err() {
                    break;
                }
            }
        });
    }
    drop(merged_tx);

    let (out_tx, out_rx) = flume::unbounded();
    scope.spawn(move || fetch_loop(merged_rx, interner, acquirer, report, out_tx));
    out_rx
}

enum Acquired {
    Path(PathBuf),
    Failed,
}

fn fetch_loop(
    input: flume::Receiver<FetchRecord>,
    interner: &Interner,
    acquirer: &dyn ArchiveAcquirer,
    report: &Mutex<Report>,
    out: flume::Sender<DifferRecord>,
) {
    let mut pkg_state: HashMap<PackageRef, Acquired> = HashMap::new();
    for record in input.iter() {
        let first_seen = !pkg_state.contains_key(&record.pkg);
        let state = pkg_state.entry(record.pkg).or_insert_with(|| {
            let name = record.pkg.to_str(interner);
            match acquirer.acquire(name) {
                Ok(path) => Acquired::Path(path),
                Err(err) => {
                    lock_report(report).fetch_failed(name, &err);
                    Acquired::Failed
                }
            }
        });
        match state {
            Acquired::Path(archive_path) => {
                let differ_record = DifferRecord {
                    first_of_package: first_seen,
                    pkg: record.pkg,
                    archive_path: archive_path.clone(),
                    path: record.path,
                };
                if out.send(differ_record).is_err() {
                    break;
                }
            }
            Acquired::Failed => {
                // Already reported once, above, the first time this
                // package was seen; later records for it are dropped.
            }
        }
    }
}

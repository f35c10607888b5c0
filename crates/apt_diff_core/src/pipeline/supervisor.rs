//! Wires the three pipeline stages together and exposes the driver-facing
//! handles: senders for hash-check and no-hash records, and the final
//! discrepancy count read back once the differ drains.
//!
//! Grounded on `original_source/apt_diff/apt_diff.py`'s `_launch_pipeline`/
//! `_launch` (fork three pipe-connected subprocesses, keep the parent-side
//! writable ends of the first two and the readable end of the last). This
//! reimplementation substitutes `std::thread::scope` + `flume` channels for
//! `fork` + pipes: every stage needs read access to the same `Interner` to
//! turn a `PackageRef` back into a package name, and scoped threads let them
//! all borrow it directly rather than needing it wrapped in an `Arc`.

use crate::acquire::ArchiveAcquirer;
use crate::difftool::DiffTool;
use crate::extract::ArchiveExtractor;
use crate::report::Report;
use apt_diff_types::intern::Interner;
use apt_diff_types::pipeline::FetchRecord;
use apt_diff_types::pipeline::HashCheckRecord;
use std::path::Path;
use std::sync::Mutex;
use std::thread::Scope;
use std::thread::ScopedJoinHandle;

/// Driver-facing ends of a running pipeline.
pub struct PipelineHandles<'scope> {
    pub hash_check: flume::Sender<HashCheckRecord>,
    pub bypass: flume::Sender<FetchRecord>,
    differ_done: ScopedJoinHandle<'scope, usize>,
}

impl<'scope> PipelineHandles<'scope> {
    /// Close both input channels (the in-process equivalent of closing the
    /// write end of the original's input pipes) and block for the differ's
    /// final discrepancy count.
    #[must_use]
    pub fn finish(self) -> usize {
        drop(self.hash_check);
        drop(self.bypass);
        self.differ_done.join().unwrap_or_else(|panic| {
            tracing::error!("differ stage panicked: {panic:?}");
            0
        })
    }
}

#[allow(clippy::too_many_arguments)]
pub fn spawn_pipeline<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    interner: &'scope Interner,
    max_verifier_workers: usize,
    acquirer: &'scope (dyn ArchiveAcquirer + 'scope),
    extractor: &'scope (dyn ArchiveExtractor + 'scope),
    difftool: &'scope (dyn DiffTool + 'scope),
    extraction_root: &'scope Path,
    report: &'scope Mutex<Report>,
) -> PipelineHandles<'scope> {
    let (hash_tx, hash_rx) = flume::unbounded::<HashCheckRecord>();
    let (bypass_tx, bypass_rx) = flume::unbounded::<FetchRecord>();

    let mismatches_rx = super::verifier::spawn_pool(scope, hash_rx, max_verifier_workers);
    let differ_input_rx =
        super::fetcher::spawn(scope, mismatches_rx, bypass_rx, interner, acquirer, report);
    let differ_done = scope.spawn(move || {
        super::differ::run(
            differ_input_rx,
            interner,
            extraction_root,
            extractor,
            difftool,
            report,
        )
    });

    PipelineHandles {
        hash_check: hash_tx,
        bypass: bypass_tx,
        differ_done,
    }
}

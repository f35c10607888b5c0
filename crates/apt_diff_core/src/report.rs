//! Discrepancy accounting and the final human-readable summary.
//!
//! The traversal driver and the differ both contribute to the same counters
//! (the differ runs on its own thread, see `crate::pipeline::differ`), so
//! this is the shared sink both sides hold behind a `Mutex`. Summary wording
//! follows `apt_diff.py`'s `execute()` tail section; everything else here
//! (per-record failures) goes through `tracing` per spec §7, not stdout.

use apt_diff_types::intern::Interner;
use apt_diff_types::report::Discrepancy;
use std::path::Path;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct Counters {
    pub discrepancies: usize,
    pub errors: usize,
    pub ignored_extras: usize,
    pub ignored_conffiles: usize,
    pub unverifiable_dirs: usize,
    pub unverifiable_links: usize,
}

/// The running report: accumulated counters, plus the `println!` lines the
/// spec pins to stdout (everything else goes through `tracing`).
#[derive(Debug, Default)]
pub struct Report {
    counters: Counters,
}

/// Lock `report`, recovering from poisoning: one stage panicking should not
/// take the other stages' ability to keep reporting down with it.
pub fn lock_report(report: &Mutex<Report>) -> MutexGuard<'_, Report> {
    report.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Report {
    #[must_use]
    pub const fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Record and print a discrepancy found by the traversal driver.
    pub fn discrepancy(&mut self, item: &Discrepancy, interner: &Interner) {
        println!("{}", item.display(interner));
        self.counters.discrepancies += 1;
    }

    /// Fold in the differ's own discrepancy count (content mismatches and
    /// "owned but missing in archive" reports, which it already printed
    /// itself while running).
    pub fn add_differ_discrepancies(&mut self, count: usize) {
        self.counters.discrepancies += count;
    }

    /// A conffile skipped because dpkg records it as obsolete: printed, but
    /// not counted as a discrepancy (it is expected that obsolete conffiles
    /// linger until the admin removes them by hand).
    pub fn obsolete_conffile_skipped(&self, path: &Path, pkg: &str) {
        println!("{}: skipping obsolete conffile (owned by {pkg})", path.display());
    }

    pub fn io_error(&mut self, context: impl std::fmt::Display) {
        tracing::error!("{context}");
        self.counters.errors += 1;
    }

    pub fn fetch_failed(&self, pkg: &str, err: &eyre::Report) {
        tracing::error!("unable to fully check {pkg}, it could not be fetched: {err:#}");
    }

    pub fn extract_failed(&mut self, pkg: &str, err: &eyre::Report) {
        tracing::error!("failed to extract archive for {pkg}: {err:#}");
        self.counters.errors += 1;
    }

    pub fn diff_failed(&mut self, pkg: &str, path: &Path, err: &eyre::Report) {
        tracing::error!("failed to diff {} ({pkg}): {err:#}", path.display());
        self.counters.errors += 1;
    }

    pub fn ignored_extra(&mut self) {
        self.counters.ignored_extras += 1;
    }

    pub fn ignored_conffile(&mut self) {
        self.counters.ignored_conffiles += 1;
    }

    pub fn unverifiable_dir(&mut self) {
        self.counters.unverifiable_dirs += 1;
    }

    pub fn unverifiable_link(&mut self) {
        self.counters.unverifiable_links += 1;
    }

    /// Print the final summary block, matching `apt_diff.py`'s `execute()`
    /// tail.
    pub fn print_summary(&self, elapsed: Duration) {
        println!("--------------------------------");
        println!(
            "Found {} differences between filesystem state and package state",
            self.counters.discrepancies
        );
        if self.counters.errors != 0 {
            println!(
                "Encountered {} errors that prevented a complete check",
                self.counters.errors
            );
        }
        if self.counters.ignored_conffiles != 0 {
            println!("Ignored {} conffiles", self.counters.ignored_conffiles);
        }
        if self.counters.ignored_extras != 0 {
            println!(
                "Ignored {} extra paths not owned by any package",
                self.counters.ignored_extras
            );
        }
        if self.counters.unverifiable_dirs != 0 {
            println!(
                "Skipped {} unverifiable directories",
                self.counters.unverifiable_dirs
            );
        }
        if self.counters.unverifiable_links != 0 {
            println!(
                "Skipped {} unverifiable symbolic links",
                self.counters.unverifiable_links
            );
        }
        println!("Finished in {:.3} seconds", elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_differ_discrepancies_accumulates() {
        let mut report = Report::default();
        report.add_differ_discrepancies(3);
        report.add_differ_discrepancies(2);
        assert_eq!(report.counters().discrepancies, 5);
    }

    #[test]
    fn extract_failed_counts_as_error() {
        let mut report = Report::default();
        report.extract_failed("hello", &eyre::eyre!("boom"));
        assert_eq!(report.counters().errors, 1);
    }
}

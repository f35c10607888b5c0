//! Pipeline configuration.
//!
//! Plain data, built by the binary crate from parsed CLI flags; the core
//! crate never sees `clap` types, matching the split the teacher draws
//! between `paketkoll` (CLI) and `paketkoll_core::config`
//! (`CheckAllFilesConfiguration`/`CommonFileCheckConfiguration`).

use std::path::PathBuf;

/// Everything the pipeline needs to know to run one check.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into))]
#[non_exhaustive]
pub struct PipelineConfig {
    /// Explicit package names to check (`-p`/`--package`). Empty means "not
    /// restricted by package".
    #[builder(default)]
    pub packages: Vec<String>,
    /// Explicit paths to check (`-f`/`--path`). Empty means "not restricted
    /// by path" (i.e. check everything).
    #[builder(default)]
    pub paths: Vec<PathBuf>,
    /// Raw `-o key=value` options forwarded to the package manager when
    /// acquiring archives.
    #[builder(default)]
    pub apt_options: Vec<String>,
    /// `--ignore-conffiles`: don't report conffiles that differ from their
    /// recorded hash (they are expected to be locally modified).
    #[builder(default)]
    pub ignore_conffiles: bool,
    /// Inverse of `--no-ignore-extras`: report paths on disk that no
    /// installed package owns. Off by default (extras are noisy and usually
    /// not interesting).
    #[builder(default)]
    pub report_extras: bool,
    /// Inverse of `--no-override-cache`: when not running as root, redirect
    /// the package manager's archive cache into the tempdir rather than
    /// writing to the system cache.
    #[builder(default = "true")]
    pub override_cache: bool,
    /// `--report-unverifiable`: emit a report line for expected entries that
    /// exist but aren't plain files dpkg can content-check (device nodes,
    /// sockets, FIFOs, unreadable symlinks/directories).
    #[builder(default)]
    pub report_unverifiable: bool,
    /// `--tempdir`: root directory for archive downloads and extraction.
    /// Defaults to a fresh directory under the system temp dir.
    #[builder(default)]
    pub tempdir: Option<PathBuf>,
    /// Inverse of `--no-remove-extracted`: delete the extraction directory
    /// when the run finishes.
    #[builder(default = "true")]
    pub remove_extracted: bool,
    /// Maximum number of concurrent hash-verification workers.
    #[builder(default = "5")]
    pub max_verifier_workers: usize,
}

impl PipelineConfig {
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

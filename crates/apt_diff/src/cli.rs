//! Command-line interface for `apt-diff`.

use clap::Parser;
use std::path::PathBuf;

/// Reconcile a Debian filesystem against what dpkg expects to be installed.
#[derive(Debug, Parser)]
#[command(name = "apt-diff", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Check this package (may be given multiple times)
    #[arg(short = 'p', long = "package")]
    pub(crate) package: Vec<String>,
    /// Check this path (may be given multiple times)
    #[arg(short = 'f', long = "path")]
    pub(crate) path: Vec<PathBuf>,
    /// Pass `k=v` through to the package manager when fetching archives (may
    /// be given multiple times)
    #[arg(short = 'o', long = "apt-option")]
    pub(crate) apt_option: Vec<String>,
    /// Skip files that have any conffile status, instead of checking them
    #[arg(long)]
    pub(crate) ignore_conffiles: bool,
    /// Report paths on disk that no installed package owns (default: suppressed)
    #[arg(long)]
    pub(crate) no_ignore_extras: bool,
    /// Do not redirect the package manager's archive cache into the tempdir
    /// when running as a non-root user
    #[arg(long)]
    pub(crate) no_override_cache: bool,
    /// Report expected entries that exist but cannot be content-checked
    /// (device nodes, sockets, FIFOs, unreadable symlinks/directories)
    #[arg(long)]
    pub(crate) report_unverifiable: bool,
    /// Root directory for archive downloads and extraction (default: a fresh
    /// directory under the system temp dir)
    #[arg(long)]
    pub(crate) tempdir: Option<PathBuf>,
    /// Keep the extracted archive trees around after the run finishes
    #[arg(long)]
    pub(crate) no_remove_extracted: bool,

    /// Paths (must start with `/`) and/or package names to check
    #[arg(value_name = "PATH|PACKAGE")]
    pub(crate) targets: Vec<String>,
}

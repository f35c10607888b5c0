//! Discrepancy reporting vocabulary.
//!
//! These are the lines the traversal driver and the differ print to describe
//! how the filesystem disagrees with dpkg's expectations (spec's testable
//! scenarios: unmodified/modified file, missing conffile, extra path,
//! directory/symlink conflict, obsolete conffile).

use crate::intern::Interner;
use crate::intern::PackageRef;
use std::fmt::Display;
use std::path::PathBuf;

/// Coarse type of filesystem entry, used only for conflict reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EntryType {
    RegularFile,
    Directory,
    Symlink,
    Other,
}

impl From<std::fs::FileType> for EntryType {
    fn from(value: std::fs::FileType) -> Self {
        if value.is_dir() {
            Self::Directory
        } else if value.is_file() {
            Self::RegularFile
        } else if value.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegularFile => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Symlink => write!(f, "symlink"),
            Self::Other => write!(f, "special file"),
        }
    }
}

/// A single discrepancy found between the filesystem and dpkg's
/// expectations.
#[derive(Debug)]
pub struct Discrepancy {
    pub path: PathBuf,
    pub package: Option<PackageRef>,
    pub kind: DiscrepancyKind,
}

impl Discrepancy {
    #[must_use]
    pub const fn new(path: PathBuf, package: Option<PackageRef>, kind: DiscrepancyKind) -> Self {
        Self {
            path,
            package,
            kind,
        }
    }

    /// Render as `<path>: <kind> (owned by <package>)`, resolving the
    /// package name through `interner`.
    pub fn display<'i>(&'i self, interner: &'i Interner) -> impl Display + 'i {
        struct D<'i>(&'i Discrepancy, &'i Interner);
        impl Display for D<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}: {}", self.0.path.display(), self.0.kind)?;
                if let Some(pkg) = self.0.package {
                    write!(f, " (owned by {})", pkg.to_str(self.1))?;
                }
                Ok(())
            }
        }
        D(self, interner)
    }
}

/// What kind of disagreement was found.
#[derive(Debug)]
#[non_exhaustive]
pub enum DiscrepancyKind {
    /// dpkg expects this path to exist, nothing is there.
    Missing,
    /// Nothing owns this path according to dpkg, but something exists.
    Extra,
    /// The expected file exists but its content doesn't hash to the
    /// expected value (reported by the differ with the unified diff on
    /// stdout, this variant is just the summary record).
    Modified,
    /// dpkg records this conffile as obsolete (no installed version ships
    /// it any more) but it's still on disk.
    ObsoleteConffile,
    /// A path is claimed as a directory by one expectation and as a
    /// non-directory by another (or by the filesystem).
    TypeConflict {
        expected: EntryType,
        actual: EntryType,
    },
    /// A plain file was expected but a broken symlink is there instead.
    BrokenSymlinkExpectedFile,
    /// A plain file was expected but a symlink to a directory is there
    /// instead.
    SymlinkedDirectoryExpectedFile,
    /// A plain file was expected but a symlink to something other than a
    /// plain file or directory is there instead.
    SymlinkedSpecialExpectedFile,
    /// Expected entry exists but isn't a plain file dpkg can verify the
    /// content of (device node, FIFO, socket, ...); only surfaced when
    /// `--report-unverifiable` is set.
    Unverifiable { actual: EntryType },
    /// This package's archive couldn't be fetched or extracted, so its
    /// files couldn't be checked.
    Unreadable,
}

impl Display for DiscrepancyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Extra => write!(f, "extra file not owned by any package"),
            Self::Modified => write!(f, "modified"),
            Self::ObsoleteConffile => write!(f, "obsolete conffile still present"),
            Self::TypeConflict { expected, actual } => {
                write!(f, "expected {expected}, found {actual}")
            }
            Self::BrokenSymlinkExpectedFile => write!(f, "broken symlink supposed to be file"),
            Self::SymlinkedDirectoryExpectedFile => {
                write!(f, "symlinked directory supposed to be file")
            }
            Self::SymlinkedSpecialExpectedFile => write!(f, "symlinked special file"),
            Self::Unverifiable { actual } => write!(f, "unverifiable {actual}"),
            Self::Unreadable => write!(f, "package archive unavailable, could not verify"),
        }
    }
}

//! Error classification.
//!
//! Per-record failures (a malformed metadata line, a failed fetch, an I/O
//! error reading one file) are logged and degrade the affected record; they
//! never propagate as `Err` across a pipeline stage boundary. [`Error`] is
//! for the smaller set of things that *do* need to propagate: fatal startup
//! failures, and the handful of internal invariant checks worth making
//! explicit.

/// Coarse classification of a failure, used when deciding whether something
/// is worth a fatal abort versus a logged-and-continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed dpkg metadata (a `.list`/`.md5sums`/`Conffiles` line that
    /// doesn't match the expected format).
    InputParse,
    /// Filesystem I/O failure unrelated to parsing.
    Io,
    /// Failed to acquire (download) or extract a package archive.
    Acquire,
    /// An internal invariant was violated (should be unreachable).
    Consistency,
    /// Not really an error: the run found one or more discrepancies.
    Discrepancy,
    /// Unrecoverable: abort the whole run.
    Fatal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InputParse => "input parse error",
            Self::Io => "I/O error",
            Self::Acquire => "archive acquisition error",
            Self::Consistency => "internal consistency error",
            Self::Discrepancy => "discrepancy",
            Self::Fatal => "fatal error",
        };
        f.write_str(s)
    }
}

/// A fatal, crate-propagated error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} is not a valid temp directory: paths used as pipeline field separators cannot contain spaces")]
    TempdirContainsSpace(std::path::PathBuf),
    #[error("failed to set up temp directory layout")]
    TempdirSetup(#[source] std::io::Error),
    #[error("internal consistency error: {0}")]
    Consistency(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] eyre::Report),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Records that flow between the pipeline stages.
//!
//! Forked helper processes historically passed these as space-separated text
//! lines over pipes. Here the stages are threads connected by typed channels
//! (see `apt_diff_core::pipeline`), so the records below are the in-process
//! equivalent of that wire format. A `Display` impl is kept for each, since
//! the differ's and fetcher's logging wants to say what the line would have
//! looked like on the wire.

use crate::hash::Hash;
use crate::intern::PackageRef;
use std::fmt::Display;
use std::path::PathBuf;

/// Driver → hash verifier: `pkg SP hash SP path LF`.
#[derive(Debug, Clone)]
pub struct HashCheckRecord {
    pub pkg: PackageRef,
    pub hash: Hash,
    pub path: PathBuf,
}

/// Verifier → fetcher (mismatches only), and driver → fetcher (no-hash
/// bypass): `pkg SP path LF`.
#[derive(Debug, Clone)]
pub struct FetchRecord {
    pub pkg: PackageRef,
    pub path: PathBuf,
}

/// Fetcher → differ: `T|F SP pkg SP archive_path SP path LF`.
#[derive(Debug, Clone)]
pub struct DifferRecord {
    /// `true` for the first record of a successfully-acquired package
    /// (`T`): the differ must extract its archive before diffing.
    pub first_of_package: bool,
    pub pkg: PackageRef,
    pub archive_path: PathBuf,
    pub path: PathBuf,
}

impl HashCheckRecord {
    pub fn display<'i>(&'i self, interner: &'i crate::intern::Interner) -> impl Display + 'i {
        struct D<'i>(&'i HashCheckRecord, &'i crate::intern::Interner);
        impl Display for D<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    "{} {} {}",
                    self.0.pkg.to_str(self.1),
                    self.0.hash,
                    self.0.path.display()
                )
            }
        }
        D(self, interner)
    }
}

impl FetchRecord {
    pub fn display<'i>(&'i self, interner: &'i crate::intern::Interner) -> impl Display + 'i {
        struct D<'i>(&'i FetchRecord, &'i crate::intern::Interner);
        impl Display for D<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    "{} {}",
                    self.0.pkg.to_str(self.1),
                    self.0.path.display()
                )
            }
        }
        D(self, interner)
    }
}

impl DifferRecord {
    pub fn display<'i>(&'i self, interner: &'i crate::intern::Interner) -> impl Display + 'i {
        struct D<'i>(&'i DifferRecord, &'i crate::intern::Interner);
        impl Display for D<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    "{} {} {} {}",
                    if self.0.first_of_package { "T" } else { "F" },
                    self.0.pkg.to_str(self.1),
                    self.0.archive_path.display(),
                    self.0.path.display()
                )
            }
        }
        D(self, interner)
    }
}

//! Extracting a downloaded `.deb` into a scratch directory.
//!
//! Grounded on `original_source/apt_diff/dpkg_helper.py::extract_archive`,
//! which shells out to `dpkg-deb -x` rather than unpacking the archive
//! format in-process (unlike the teacher's own `utils.rs::extract_files`,
//! which decodes `ar`/`tar`/compression itself; apt-diff only ever deals
//! with genuine `.deb`s dpkg itself produced, so there is no reason to
//! reimplement what `dpkg-deb` already does correctly).

use eyre::WrapErr;
use std::path::Path;

/// Unpacks a package archive into a destination directory.
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive_path: &Path, destination: &Path) -> eyre::Result<()>;
}

/// Extracts via `dpkg-deb -x <archive> <destination>`.
pub struct DpkgDebExtractor;

impl ArchiveExtractor for DpkgDebExtractor {
    fn extract(&self, archive_path: &Path, destination: &Path) -> eyre::Result<()> {
        // Remove any prior contents first: this directory is reused across
        // runs sharing a `--tempdir`, and a stale extraction from a
        // different package version would corrupt the differ's
        // file-exists and diff checks.
        if let Err(err) = std::fs::remove_dir_all(destination) {
            if err.kind() != std::io::ErrorKind::NotFound {
                return Err(err)
                    .wrap_err_with(|| format!("failed to clear {}", destination.display()));
            }
        }
        std::fs::create_dir_all(destination)
            .wrap_err_with(|| format!("failed to create {}", destination.display()))?;
        let status = std::process::Command::new("dpkg-deb")
            .arg("-x")
            .arg(archive_path)
            .arg(destination)
            .stdin(std::process::Stdio::null())
            .status()
            .wrap_err_with(|| format!("failed to run dpkg-deb -x for {}", archive_path.display()))?;
        if !status.success() {
            eyre::bail!(
                "dpkg-deb -x {} {} exited with {status}",
                archive_path.display(),
                destination.display()
            );
        }
        Ok(())
    }
}

//! Fetching a package's archive from the configured APT sources.
//!
//! Subprocess-spawning style grounded on
//! `backend/deb/divert.rs::get_diversions` (`std::process::Command`,
//! `eyre::WrapErr`, `regex::Regex` for parsing the output). The actual
//! command line and the filename-disambiguation logic are grounded on
//! `original_source/apt_diff/apt_helper.py::fetch_archive`: that function
//! forces `apt` to re-download the *currently installed* version (not
//! merely "a candidate") by doing a reinstall-only, download-only
//! transaction, then scans the cache directory for the resulting
//! `<name>_<version>_<arch>.deb` and only accepts the entry whose name and
//! architecture match the package being fetched.

use eyre::WrapErr;
use std::path::Path;
use std::path::PathBuf;

/// Resolves a package name to a downloaded `.deb` archive on disk.
pub trait ArchiveAcquirer: Send + Sync {
    /// Fetch `pkg`'s currently-installed archive, returning the path to the
    /// downloaded `.deb`.
    fn acquire(&self, pkg: &str) -> eyre::Result<PathBuf>;
}

/// Acquires archives via `apt-get install --reinstall --download-only`,
/// matching the original's `apt_pkg`-based forced re-download.
pub struct AptAcquirer {
    /// Destination directory for downloaded archives. `None` means "let APT
    /// use its own configured cache" (only sensible when running as root;
    /// see `--no-override-cache`).
    archive_dir: Option<PathBuf>,
    apt_options: Vec<String>,
}

impl AptAcquirer {
    #[must_use]
    pub fn new(archive_dir: Option<PathBuf>, apt_options: Vec<String>) -> Self {
        Self {
            archive_dir,
            apt_options,
        }
    }

    fn cache_dir(&self) -> &Path {
        self.archive_dir
            .as_deref()
            .unwrap_or_else(|| Path::new("/var/cache/apt/archives"))
    }
}

impl ArchiveAcquirer for AptAcquirer {
    fn acquire(&self, pkg: &str) -> eyre::Result<PathBuf> {
        let mut cmd = std::process::Command::new("apt-get");
        cmd.arg("install")
            .arg("--reinstall")
            .arg("--download-only")
            .arg("--yes")
            .arg("--quiet");
        if let Some(dir) = &self.archive_dir {
            cmd.arg("-o")
                .arg(format!("Dir::Cache::Archives={}", dir.display()));
        }
        for option in &self.apt_options {
            cmd.arg("-o").arg(option);
        }
        cmd.arg(pkg);

        let output = cmd
            .output()
            .wrap_err_with(|| format!("failed to run apt-get for {pkg}"))?;
        if !output.status.success() {
            eyre::bail!(
                "apt-get exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        find_downloaded_archive(self.cache_dir(), pkg)
            .wrap_err_with(|| format!("could not find downloaded archive for {pkg}"))
    }
}

/// Scan `cache_dir` for a `<name>_<version>_<arch>.deb` whose `name` is
/// `pkg` (with any `:arch` qualifier split off first and matched against
/// the filename's own arch component, rather than against `name`), picking
/// the most-recently-modified match if more than one version happens to be
/// cached. `pkg` without a `:arch` qualifier matches any architecture,
/// matching the original's `apt_pkg`-resolved install, which is always
/// single-arch for an unqualified name.
fn find_downloaded_archive(cache_dir: &Path, pkg: &str) -> eyre::Result<PathBuf> {
    let (name, wanted_arch) = match pkg.split_once(':') {
        Some((name, arch)) => (name, Some(arch)),
        None => (pkg, None),
    };
    let mut candidates: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
    let entries = std::fs::read_dir(cache_dir)
        .wrap_err_with(|| format!("failed to read {}", cache_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(std::ffi::OsStr::to_str) else {
            continue;
        };
        let Some(stem) = file_name.strip_suffix(".deb") else {
            continue;
        };
        let parts: Vec<&str> = stem.splitn(3, '_').collect();
        let [pkg_part, _version, arch_part] = parts[..] else {
            continue;
        };
        if pkg_part != name {
            continue;
        }
        if let Some(wanted_arch) = wanted_arch {
            if arch_part != wanted_arch {
                continue;
            }
        }
        let modified = entry.metadata().and_then(|m| m.modified()).ok();
        candidates.push((modified.unwrap_or(std::time::UNIX_EPOCH), path));
    }
    candidates.sort_by_key(|(modified, _)| *modified);
    candidates.pop().map(|(_, path)| path).ok_or_else(|| {
        eyre::eyre!(
            "no cached archive matching {name}_*_{}.deb in {}",
            wanted_arch.unwrap_or("*"),
            cache_dir.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_matching_archive_by_package_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello_2.10-2build2_amd64.deb"), b"").unwrap();
        std::fs::write(dir.path().join("hello-data_2.10-2_all.deb"), b"").unwrap();
        let found = find_downloaded_archive(dir.path(), "hello").unwrap();
        assert_eq!(found.file_name().unwrap(), "hello_2.10-2build2_amd64.deb");
    }

    #[test]
    fn errors_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_downloaded_archive(dir.path(), "hello").is_err());
    }

    #[test]
    fn arch_qualified_name_matches_only_that_arch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("libfoo_1.0_amd64.deb"), b"").unwrap();
        std::fs::write(dir.path().join("libfoo_1.0_i386.deb"), b"").unwrap();
        let found = find_downloaded_archive(dir.path(), "libfoo:i386").unwrap();
        assert_eq!(found.file_name().unwrap(), "libfoo_1.0_i386.deb");
    }

    #[test]
    fn arch_qualified_name_errors_when_only_other_archs_cached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("libfoo_1.0_amd64.deb"), b"").unwrap();
        assert!(find_downloaded_archive(dir.path(), "libfoo:i386").is_err());
    }

    #[test]
    fn unqualified_name_matches_any_arch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello_2.10-2build2_amd64.deb"), b"").unwrap();
        let found = find_downloaded_archive(dir.path(), "hello").unwrap();
        assert_eq!(found.file_name().unwrap(), "hello_2.10-2build2_amd64.deb");
    }
}

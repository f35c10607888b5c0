//! Temp directory layout: archive cache redirection and the extraction root.
//!
//! Grounded on `original_source/apt_diff/apt_diff.py`'s `main()` tail
//! (`_ensure_dir`, the `Dir::Cache::Archives` redirect, the
//! `tempdir.find(" ")` rejection) since the teacher has no equivalent of its
//! own (`paketkoll` never downloads or extracts anything, so it has no temp
//! layout to manage).

use crate::error::Error;
use std::path::Path;
use std::path::PathBuf;

/// Resolved temp layout for one run.
pub struct TempLayout {
    /// Root of the temp tree (either `--tempdir` or a per-uid default under
    /// the system temp dir).
    pub root: PathBuf,
    /// Destination for downloaded archives, when the cache is redirected
    /// (non-root, `--no-override-cache` absent). `None` means let the
    /// package manager use its own configured cache.
    pub archive_dir: Option<PathBuf>,
    /// Root directory the differ extracts each package's archive under.
    pub extraction_root: PathBuf,
}

/// Build and create the temp layout for one run.
///
/// `tempdir` is `--tempdir`'s value, if given. `override_cache` is the
/// config flag (true unless `--no-override-cache`); the cache is only
/// actually redirected when it is set *and* the process is not running as
/// root.
pub fn prepare(
    tempdir: Option<&Path>,
    override_cache: bool,
    running_as_root: bool,
) -> crate::Result<TempLayout> {
    let root = match tempdir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::temp_dir().join(format!("apt-diff_{}", nix::unistd::getuid())),
    };
    // Pipeline records are space-separated; a tempdir path containing a
    // space would corrupt the wire format the moment an archive or
    // extraction path under it got embedded in a record.
    if root.to_string_lossy().contains(' ') {
        return Err(Error::TempdirContainsSpace(root));
    }
    ensure_private_dir(&root)?;

    let archive_dir = if override_cache && !running_as_root {
        let archive_dir = root.join("archives");
        ensure_private_dir(&archive_dir)?;
        ensure_private_dir(&archive_dir.join("partial"))?;
        Some(archive_dir)
    } else {
        None
    };

    let extraction_root = root.join("extracted");
    ensure_private_dir(&extraction_root)?;

    Ok(TempLayout {
        root,
        archive_dir,
        extraction_root,
    })
}

/// Create `path` (if missing) and set it to mode 0700, matching
/// `apt_diff.py`'s `_ensure_dir`: archives and extracted package contents
/// may include files the invoking user would not want other local users to
/// read.
fn ensure_private_dir(path: &Path) -> crate::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(Error::TempdirSetup)?;
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(Error::TempdirSetup)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_tempdir_with_space() {
        let err = prepare(Some(Path::new("/tmp/has space")), true, false).unwrap_err();
        assert!(matches!(err, Error::TempdirContainsSpace(_)));
    }

    #[test]
    fn root_user_never_gets_cache_redirected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = prepare(Some(dir.path()), true, true).unwrap();
        assert!(layout.archive_dir.is_none());
    }

    #[test]
    fn non_root_gets_cache_redirected_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let layout = prepare(Some(dir.path()), true, false).unwrap();
        assert_eq!(layout.archive_dir, Some(dir.path().join("archives")));
        assert!(dir.path().join("archives/partial").is_dir());
    }

    #[test]
    fn no_override_cache_flag_keeps_system_cache() {
        let dir = tempfile::tempdir().unwrap();
        let layout = prepare(Some(dir.path()), false, false).unwrap();
        assert!(layout.archive_dir.is_none());
    }
}

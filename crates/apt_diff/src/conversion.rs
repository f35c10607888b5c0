//! Converts parsed CLI arguments into an `apt_diff_core::PipelineConfig`.

use crate::cli::Cli;
use apt_diff_core::PipelineConfig;
use std::path::PathBuf;

/// One positional argument, classified the way `apt_diff.py`'s `main()`
/// classifies its trailing `argv`: anything starting with `/` is a path,
/// anything alphanumeric is a package name, anything else is a usage error.
#[derive(Debug, Clone)]
enum Target {
    Path(PathBuf),
    Package(String),
}

/// Split `targets` into paths and package names.
///
/// # Errors
/// If an argument is neither an absolute path nor alphanumeric, matching the
/// original's "Don't know what to do with" usage error (exit code 2).
fn classify_targets(targets: &[String]) -> eyre::Result<Vec<Target>> {
    targets
        .iter()
        .map(|arg| {
            if arg.starts_with('/') {
                Ok(Target::Path(PathBuf::from(arg)))
            } else if arg.starts_with(|c: char| c.is_alphanumeric()) {
                Ok(Target::Package(arg.clone()))
            } else {
                Err(eyre::eyre!("don't know what to do with \"{arg}\""))
            }
        })
        .collect()
}

impl TryFrom<Cli> for PipelineConfig {
    type Error = eyre::Error;

    fn try_from(value: Cli) -> Result<Self, Self::Error> {
        let mut packages = value.package;
        let mut paths = value.path;
        for target in classify_targets(&value.targets)? {
            match target {
                Target::Path(path) => paths.push(path),
                Target::Package(pkg) => packages.push(pkg),
            }
        }

        Ok(Self::builder()
            .packages(packages)
            .paths(paths)
            .apt_options(value.apt_option)
            .ignore_conffiles(value.ignore_conffiles)
            .report_extras(value.no_ignore_extras)
            .override_cache(!value.no_override_cache)
            .report_unverifiable(value.report_unverifiable)
            .tempdir(value.tempdir)
            .remove_extracted(!value.no_remove_extracted)
            .build()?)
    }
}

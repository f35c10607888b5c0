//! Bulk conffile status via `dpkg-query -f '${Conffiles}' -W`.

use apt_diff_types::hash::Hash;
use apt_diff_types::path::AbsolutePath;
use eyre::WrapErr;
use std::io::BufRead;

pub(crate) struct ConffileEntry {
    pub path: AbsolutePath,
    pub hash: Hash,
    pub obsolete: bool,
}

/// Query conffile status for `packages` (empty queries every installed
/// package, matching `dpkg-query -W` with no package arguments).
pub(crate) fn get_conffiles(packages: &[impl AsRef<str>]) -> eyre::Result<Vec<ConffileEntry>> {
    let mut cmd = std::process::Command::new("dpkg-query");
    cmd.arg("-f").arg("${Conffiles}\n").arg("-W");
    cmd.args(packages.iter().map(AsRef::as_ref));
    let output = cmd.output().wrap_err("failed to run dpkg-query")?;
    if !output.status.success() {
        tracing::warn!(
            "dpkg-query exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(parse_conffiles(std::io::Cursor::new(output.stdout)))
}

/// Parse the concatenated `${Conffiles}` blocks dpkg-query prints, one line
/// per conffile across every queried package.
///
/// Each field value lacks a trailing newline of its own, so the format
/// string above adds one; a package with no conffiles then contributes a
/// lone blank line, which is silently skipped rather than treated as
/// malformed.
fn parse_conffiles(mut input: impl BufRead) -> Vec<ConffileEntry> {
    let mut entries = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("failed to read dpkg-query output: {err}");
                break;
            }
        }
        let Some(trimmed) = line.strip_suffix('\n') else {
            tracing::warn!("malformed line in Conffiles output (no trailing newline): {line:?}");
            continue;
        };
        if trimmed.is_empty() {
            continue;
        }
        let Some(rest) = trimmed.strip_prefix(' ') else {
            tracing::warn!("malformed line in Conffiles output (no leading space): {trimmed:?}");
            continue;
        };
        // Paths can in principle contain spaces, so split the hash (and the
        // optional "obsolete" marker) off the right rather than the left.
        let (rest, obsolete) = match rest.strip_suffix(" obsolete") {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        let Some((path, hash_token)) = rest.rsplit_once(' ') else {
            tracing::warn!("malformed line in Conffiles output (no hash field): {trimmed:?}");
            continue;
        };
        if hash_token == "newconffile" {
            tracing::warn!(
                "dropping newconffile placeholder for {path} (registered but not yet installed)"
            );
            continue;
        }
        match Hash::parse(hash_token.as_bytes()) {
            Ok(hash) => entries.push(ConffileEntry {
                path: AbsolutePath::new(path),
                hash,
                obsolete,
            }),
            Err(err) => {
                tracing::warn!("malformed hash in Conffiles output: {err} ({trimmed:?})");
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_basic_and_obsolete_entries() {
        let input = indoc::indoc! {"
             /etc/foo.conf 1f7b7e9e7e9e7e9e7e9e7e9e7e9e7e9a

             /etc/bar.conf 1f7b7e9e7e9e7e9e7e9e7e9e7e9e7e9b obsolete
        "};
        let entries = parse_conffiles(input.as_bytes());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path.to_string(), "/etc/foo.conf");
        assert!(!entries[0].obsolete);
        assert_eq!(entries[1].path.to_string(), "/etc/bar.conf");
        assert!(entries[1].obsolete);
    }

    #[test]
    fn newconffile_placeholder_is_dropped() {
        let input = " /etc/new.conf newconffile\n";
        assert!(parse_conffiles(input.as_bytes()).is_empty());
    }

    #[test]
    fn skips_malformed_lines() {
        let input = "no-leading-space 1f7b7e9e7e9e7e9e7e9e7e9e7e9e7e9a\n";
        assert!(parse_conffiles(input.as_bytes()).is_empty());
    }
}

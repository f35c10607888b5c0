//! Parser for `.md5sums` files:
//! `<32-hex><two spaces>/<relative path>`, path starting at byte offset 34.

use apt_diff_types::hash::Hash;
use apt_diff_types::path::AbsolutePath;
use std::io::BufRead;

pub(crate) struct Md5SumEntry {
    pub path: AbsolutePath,
    pub hash: Hash,
}

pub(crate) fn parse_md5sums(input: &mut impl BufRead, pkg: &str) -> Vec<Md5SumEntry> {
    let mut entries = Vec::new();
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!("malformed line in {pkg}.md5sums: {err}");
                continue;
            }
        };
        if line.len() <= 34 {
            tracing::warn!("malformed line in {pkg}.md5sums (too short): {line:?}");
            continue;
        }
        let hash = match Hash::parse(line[..32].as_bytes()) {
            Ok(hash) => hash,
            Err(err) => {
                tracing::warn!("malformed hash in {pkg}.md5sums: {err} ({line:?})");
                continue;
            }
        };
        // Offset 32-33 are the two separator bytes; the relative path (no
        // leading slash) starts at 34.
        let mut absolute = String::with_capacity(line.len() - 33);
        absolute.push('/');
        absolute.push_str(&line[34..]);
        entries.push(Md5SumEntry {
            path: AbsolutePath::new(&absolute),
            hash,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_basic_entry() {
        let input = "d41d8cd98f00b204e9800998ecf8427e  usr/bin/hello\n";
        let mut input = input.as_bytes();
        let entries = parse_md5sums(&mut input, "hello");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path.to_string(), "/usr/bin/hello");
        assert_eq!(
            entries[0].hash.to_string(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn skips_malformed_hash() {
        let input = "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz  usr/bin/hello\n";
        let mut input = input.as_bytes();
        assert!(parse_md5sums(&mut input, "hello").is_empty());
    }
}

//! Parser for `.list` files: one absolute path per line, with the package's
//! root directory entry spelled `/.` instead of `/`.

use apt_diff_types::path::AbsolutePath;
use std::io::BufRead;

/// Parse a `.list` file.
///
/// Malformed lines never abort the load; they are logged and skipped.
pub(crate) fn parse_list(input: &mut impl BufRead, pkg: &str) -> Vec<AbsolutePath> {
    let mut paths = Vec::new();
    for line in input.lines() {
        match line {
            Ok(line) if !line.is_empty() => paths.push(AbsolutePath::new(&line)),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("malformed line in {pkg}.list: {err}");
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_root_entry() {
        let input = indoc::indoc! {"
            /.
            /usr
            /usr/bin
            /usr/bin/hello"};
        let mut input = input.as_bytes();
        let paths = parse_list(&mut input, "hello");
        assert_eq!(
            paths.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["/", "/usr", "/usr/bin", "/usr/bin/hello"]
        );
    }
}

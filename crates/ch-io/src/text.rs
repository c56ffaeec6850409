//! Plain line-list files (drop lists, process lists).

use std::fs;
use std::path::Path;

use ch_core::Result;

/// Read the non-empty, non-comment (`#`) lines of a file, trimmed.
pub fn parse_file_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    Ok(parse_lines(&fs::read_to_string(path)?))
}

/// Non-empty, non-comment lines of `text`, trimmed.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let lines = parse_lines("# header\n  CMS_a \n\nCMS_b\n#CMS_c\n");
        assert_eq!(lines, vec!["CMS_a", "CMS_b"]);
    }
}

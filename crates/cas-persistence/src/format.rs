//! The fixed tree-entry line format: `"<mode> <type> <oid>\t<name>"`.
//!
//! Exact fidelity is required here because the host object database parses
//! this same format. Names may legally contain SPACE; only the first TAB and
//! the first two SPACEs in the metadata prefix are significant.

use cas_core::CasError;

use crate::{TreeEntry, TreeEntryLine};

/// Render one entry as `"<mode> <type> <oid>\t<name>"` (no trailing newline;
/// callers join entries with `\n`).
#[must_use]
pub fn format_line(entry: &TreeEntryLine) -> String {
    format!("{} {} {}\t{}", entry.mode, entry.kind, entry.oid, entry.name)
}

/// Join entries into the newline-separated body `write_tree` persists.
#[must_use]
pub fn format_entries(entries: &[TreeEntryLine]) -> String {
    entries.iter().map(format_line).collect::<Vec<_>>().join("\n")
}

/// Parse one line into a [`TreeEntry`], splitting at the first TAB into
/// metadata and name, then splitting the metadata on single SPACEs into
/// exactly three fields (`mode`, `type`, `oid`). Any deviation fails with
/// [`CasError::TreeParseError`].
pub fn parse_line(line: &str) -> Result<TreeEntry, CasError> {
    let (metadata, name) = line
        .split_once('\t')
        .ok_or_else(|| CasError::TreeParseError { line: line.to_string() })?;
    let fields: Vec<&str> = metadata.split(' ').collect();
    let (mode, kind, oid) = match fields.as_slice() {
        [mode, kind, oid] => (*mode, *kind, *oid),
        _ => return Err(CasError::TreeParseError { line: line.to_string() }),
    };
    if mode.is_empty() || kind.is_empty() || oid.is_empty() {
        return Err(CasError::TreeParseError { line: line.to_string() });
    }
    Ok(TreeEntry { mode: mode.to_string(), kind: kind.to_string(), oid: oid.to_string(), name: name.to_string() })
}

/// Parse an entire tree body (one entry per line; blank bodies yield an
/// empty sequence).
pub fn parse_entries(body: &str) -> Result<Vec<TreeEntry>, CasError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    body.lines().map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_line() {
        let entry = parse_line("100644 blob abc123def456\tmanifest.json").unwrap();
        assert_eq!(entry.mode, "100644");
        assert_eq!(entry.kind, "blob");
        assert_eq!(entry.oid, "abc123def456");
        assert_eq!(entry.name, "manifest.json");
    }

    #[test]
    fn rejects_missing_tab() {
        let err = parse_line("100644 blob abc123 no-tab").unwrap_err();
        assert_eq!(err.code(), "TREE_PARSE_ERROR");
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = parse_line("100644 blob\tname").unwrap_err();
        assert_eq!(err.code(), "TREE_PARSE_ERROR");
    }

    #[test]
    fn rejects_extra_space_separated_metadata_field() {
        let err = parse_line("100644 blob abc123 extra\tname").unwrap_err();
        assert_eq!(err.code(), "TREE_PARSE_ERROR");
    }

    #[test]
    fn name_may_contain_spaces() {
        let entry = parse_line("100644 blob deadbeef\tfile with spaces.bin").unwrap();
        assert_eq!(entry.name, "file with spaces.bin");
    }

    #[test]
    fn empty_body_yields_empty_sequence() {
        assert_eq!(parse_entries("").unwrap(), Vec::new());
    }

    #[test]
    fn format_then_parse_round_trips() {
        let entry = TreeEntryLine::blob("oid-1", "manifest.json");
        let line = format_line(&entry);
        let parsed = parse_line(&line).unwrap();
        assert_eq!(parsed.mode, entry.mode);
        assert_eq!(parsed.kind, entry.kind);
        assert_eq!(parsed.oid, entry.oid);
        assert_eq!(parsed.name, entry.name);
    }
}

//! Field-ID utilities shared by the converter and extractor front ends.
//!
//! A *field identifier* is a purely numeric string (e.g. `"31"`) naming a
//! logical biomedical variable. In the columnar file it is encoded by one or
//! more *physical columns* named either exactly `<id>` or
//! `<id>-<instance>.<array_index>` (e.g. `31-0.0`, `31-1.0`). The mandatory
//! `eid` subject-identifier column is always carried along.
//!
//! One matching rule is used everywhere: a column belongs to a field ID when
//! it equals the ID exactly or starts with `<id>-`. The prefix includes the
//! dash, so requesting field `3` never captures `31-0.0`.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::BiotabError;

/// The distinguished subject-identifier column present in every dataset.
pub const EID_COLUMN: &str = "eid";

/// Reads field IDs from a text file, one per line. Whitespace is trimmed and
/// blank lines are dropped; file order is preserved. The values are *not*
/// validated here.
pub fn read_field_ids(path: &Path) -> Result<Vec<String>, BiotabError> {
    if !path.exists() {
        return Err(BiotabError::NotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Validates a sequence of field IDs, trimming surrounding whitespace.
///
/// Fails with [`BiotabError::Validation`] naming the first value that is not
/// composed entirely of decimal digits; no partial result is returned.
pub fn validate_field_ids<I, S>(field_ids: I) -> Result<Vec<String>, BiotabError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut validated = Vec::new();
    for field_id in field_ids {
        let trimmed = field_id.as_ref().trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BiotabError::Validation(trimmed.to_string()));
        }
        validated.push(trimmed.to_string());
    }
    Ok(validated)
}

/// The single column-matching predicate: exact ID match, or `<id>-` prefix.
pub fn is_field_column(column: &str, field_id: &str) -> bool {
    column == field_id
        || (column.len() > field_id.len()
            && column.starts_with(field_id)
            && column.as_bytes()[field_id.len()] == b'-')
}

/// Resolves the physical columns encoding the requested field IDs, walking
/// `all_columns` in order so the selection follows the file's schema order.
///
/// `eid` is always the first entry. With an `instance` qualifier, only the
/// exact column `<id>-<instance>` is selected for each ID; an ID with no such
/// column is silently skipped.
pub fn resolve_columns(
    all_columns: &[String],
    field_ids: &BTreeSet<String>,
    instance: Option<&str>,
) -> Vec<String> {
    let mut selected = vec![EID_COLUMN.to_string()];

    match instance {
        Some(instance) => {
            // Exact-instance selection is keyed by name, not schema walk, but
            // stays deterministic because the ID set is ordered.
            for field_id in field_ids {
                let wanted = format!("{field_id}-{instance}");
                if all_columns.iter().any(|col| *col == wanted) {
                    selected.push(wanted);
                }
            }
        }
        None => {
            for column in all_columns {
                if column == EID_COLUMN {
                    continue;
                }
                if field_ids.iter().any(|id| is_field_column(column, id)) {
                    selected.push(column.clone());
                }
            }
        }
    }

    selected
}

/// Returns `eid` plus every column encoding one of the requested field IDs.
pub fn field_columns(all_columns: &[String], field_ids: &BTreeSet<String>) -> Vec<String> {
    resolve_columns(all_columns, field_ids, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn ids(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn validate_accepts_numeric_ids_and_trims() {
        let validated = validate_field_ids(["31", " 21 ", "4079"]).unwrap();
        assert_eq!(validated, vec!["31", "21", "4079"]);
    }

    #[test]
    fn validate_rejects_first_non_numeric_id() {
        let result = validate_field_ids(["31", "x21", "40"]);
        match result {
            Err(BiotabError::Validation(value)) => assert_eq!(value, "x21"),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_empty_and_blank_ids() {
        assert!(validate_field_ids([""]).is_err());
        assert!(validate_field_ids(["   "]).is_err());
        assert!(validate_field_ids(["3 1"]).is_err());
    }

    #[test]
    fn matching_requires_exact_id_or_dashed_prefix() {
        assert!(is_field_column("31", "31"));
        assert!(is_field_column("31-0.0", "31"));
        assert!(is_field_column("31-2.1", "31"));
        // Field 3 must not capture field 31's columns.
        assert!(!is_field_column("31-0.0", "3"));
        assert!(!is_field_column("310", "31"));
        assert!(!is_field_column("eid", "31"));
    }

    #[test]
    fn resolution_preserves_schema_order_and_prepends_eid() {
        let all = cols(&["eid", "31-0.0", "21-0.0", "31-1.0", "40"]);
        let selected = resolve_columns(&all, &ids(&["31", "40"]), None);
        assert_eq!(selected, cols(&["eid", "31-0.0", "31-1.0", "40"]));
    }

    #[test]
    fn instance_resolution_selects_exact_column_only() {
        let all = cols(&["eid", "31-0.0", "31-1.0", "31-2.0", "21-2.0"]);
        let selected = resolve_columns(&all, &ids(&["31"]), Some("2.0"));
        assert_eq!(selected, cols(&["eid", "31-2.0"]));

        // A missing instance is silently skipped, never an error.
        let selected = resolve_columns(&all, &ids(&["31"]), Some("9.9"));
        assert_eq!(selected, cols(&["eid"]));
    }

    #[test]
    fn field_columns_always_leads_with_eid() {
        let all = cols(&["eid", "50-0.0"]);
        let selected = field_columns(&all, &ids(&["50"]));
        assert_eq!(selected[0], EID_COLUMN);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn read_field_ids_trims_and_drops_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "31\n\n  21  \n40\n").unwrap();

        let read = read_field_ids(file.path()).unwrap();
        assert_eq!(read, vec!["31", "21", "40"]);
    }

    #[test]
    fn read_field_ids_missing_file_is_not_found() {
        let result = read_field_ids(Path::new("/nonexistent/fields.txt"));
        assert!(matches!(result, Err(BiotabError::NotFound(_))));
    }
}

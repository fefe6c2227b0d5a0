//! The empty-row filtering kernel used by the extractor's `remove_empty` mode.
//!
//! A row survives when at least one of its *data* columns (everything after
//! the leading `eid` column) holds a value that is non-null and, for text
//! columns, non-empty after trimming whitespace. Rows that are blank across
//! every selected field carry no information for the requested extraction.

use arrow::array::{Array, BooleanArray, LargeStringArray, StringArray};
use arrow::compute::filter_record_batch;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::BiotabError;

/// Drops every row of `batch` whose columns from `data_col_start` onward are
/// all null or all-whitespace text.
pub(crate) fn filter_empty_rows(
    batch: &RecordBatch,
    data_col_start: usize,
) -> Result<RecordBatch, BiotabError> {
    let mask = non_empty_row_mask(batch, data_col_start)?;
    Ok(filter_record_batch(batch, &mask)?)
}

/// Builds the per-row keep mask: true when any data column is populated.
fn non_empty_row_mask(
    batch: &RecordBatch,
    data_col_start: usize,
) -> Result<BooleanArray, BiotabError> {
    let mut keep = vec![false; batch.num_rows()];

    for column in batch.columns().iter().skip(data_col_start) {
        match column.data_type() {
            DataType::Utf8 => {
                let strings = downcast::<StringArray>(column.as_any(), "StringArray")?;
                for (row, keep_row) in keep.iter_mut().enumerate() {
                    if !*keep_row && strings.is_valid(row) && !strings.value(row).trim().is_empty()
                    {
                        *keep_row = true;
                    }
                }
            }
            DataType::LargeUtf8 => {
                let strings = downcast::<LargeStringArray>(column.as_any(), "LargeStringArray")?;
                for (row, keep_row) in keep.iter_mut().enumerate() {
                    if !*keep_row && strings.is_valid(row) && !strings.value(row).trim().is_empty()
                    {
                        *keep_row = true;
                    }
                }
            }
            // Non-text columns cannot be "blank": validity is the only signal.
            _ => {
                for (row, keep_row) in keep.iter_mut().enumerate() {
                    if !*keep_row && column.is_valid(row) {
                        *keep_row = true;
                    }
                }
            }
        }
    }

    Ok(BooleanArray::from(keep))
}

fn downcast<'a, T: 'static>(
    column: &'a dyn std::any::Any,
    expected: &str,
) -> Result<&'a T, BiotabError> {
    column.downcast_ref::<T>().ok_or_else(|| {
        BiotabError::Internal(format!("column failed to downcast to {expected}"))
    })
}

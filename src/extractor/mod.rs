//! The extractor pipeline: selected fields out of Parquet, back into
//! delimited text.
//!
//! Requested logical field IDs are resolved against the file's schema into
//! the physical columns that encode them (one field may have many
//! instance-qualified columns), the file is read with a column projection so
//! unrelated data is never decoded, and the result streams into a CSV file
//! with the mandatory `eid` column always first.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::WriterBuilder;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;

use crate::converter::{ensure_parent_dir, temp_output_path};
use crate::error::BiotabError;
use crate::fields::{self, EID_COLUMN};

mod filter;

/// Rows decoded per read batch. Distinct from the writer-side row-group
/// size: this only bounds decode memory during extraction.
const READ_BATCH_SIZE: usize = 8_192;

//==================================================================================
// 1. Options
//==================================================================================

/// Caller-supplied selection and filtering options for an extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Field IDs supplied directly (e.g. from repeated CLI flags).
    pub field_ids: Option<Vec<String>>,

    /// Path to a text file with one field ID per line.
    pub field_id_file: Option<PathBuf>,

    /// Drop rows where every selected non-eid value is null or blank text.
    pub remove_empty: bool,

    /// Restrict selection to the exact instance-qualified column
    /// `<id>-<instance>` per field (e.g. `"2.0"`). IDs with no such column
    /// are silently skipped.
    pub instance: Option<String>,
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Extracts the requested fields from a Parquet file into a delimited text
/// file, returning the set of logical field IDs that were processed
/// (excluding `eid`).
///
/// At least one of `field_ids` / `field_id_file` must be supplied
/// ([`BiotabError::InvalidArgument`] otherwise); the input must exist
/// ([`BiotabError::NotFound`]) and its schema must contain the mandatory
/// `eid` column ([`BiotabError::Schema`]).
pub fn extract(
    input: &Path,
    output: &Path,
    options: &ExtractOptions,
) -> Result<BTreeSet<String>, BiotabError> {
    // 1. Preconditions.
    let cli_ids = options.field_ids.as_deref().filter(|ids| !ids.is_empty());
    if cli_ids.is_none() && options.field_id_file.is_none() {
        return Err(BiotabError::InvalidArgument(
            "must provide either field_ids or field_id_file".to_string(),
        ));
    }
    if !input.exists() {
        return Err(BiotabError::NotFound(input.to_path_buf()));
    }

    // 2. Gather and validate the requested IDs from both sources.
    let mut requested: BTreeSet<String> = BTreeSet::new();
    if let Some(ids) = cli_ids {
        requested.extend(fields::validate_field_ids(ids)?);
    }
    if let Some(path) = &options.field_id_file {
        requested.extend(fields::validate_field_ids(fields::read_field_ids(path)?)?);
    }

    // 3. Resolve physical columns against the file schema.
    let source = File::open(input)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(source)
        .map_err(|e| BiotabError::from(e).in_stage("parquet open"))?;

    let all_columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    if !all_columns.iter().any(|c| c == EID_COLUMN) {
        return Err(BiotabError::Schema(format!(
            "mandatory '{EID_COLUMN}' column missing from {}",
            input.display()
        )));
    }

    let selection = fields::resolve_columns(&all_columns, &requested, options.instance.as_deref());
    log::debug!(
        "resolved {} physical column(s) for {} requested field(s)",
        selection.len(),
        requested.len()
    );

    // 4. Build a projected reader and the output schema in selection order.
    // The projection alone is not enough: projected batches come back in file
    // order, and eid must be the first output column.
    let out_schema = selection_schema(builder.schema(), &selection)?;
    let projection = ProjectionMask::roots(
        builder.parquet_schema(),
        selection.iter().filter_map(|name| {
            all_columns.iter().position(|col| col == name)
        }),
    );
    let reader = builder
        .with_projection(projection)
        .with_batch_size(READ_BATCH_SIZE)
        .build()
        .map_err(|e| BiotabError::from(e).in_stage("parquet read"))?;

    // 5. Stream into the CSV sink behind a temp file.
    ensure_parent_dir(output)?;
    let tmp = temp_output_path(output);
    let result = write_csv(reader, &tmp, Arc::clone(&out_schema), options, &selection);
    match result {
        Ok(total_rows) => {
            fs::rename(&tmp, output)?;
            log::info!(
                "extracted {total_rows} rows x {} columns into {}",
                selection.len(),
                output.display()
            );
            Ok(requested)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

//==================================================================================
// 3. Sink Internals
//==================================================================================

fn write_csv(
    reader: impl Iterator<Item = Result<RecordBatch, arrow::error::ArrowError>>,
    tmp: &Path,
    out_schema: SchemaRef,
    options: &ExtractOptions,
    selection: &[String],
) -> Result<u64, BiotabError> {
    let sink = File::create(tmp)?;
    let mut writer = WriterBuilder::new().with_header(true).build(sink);

    // Filtering is a no-op when nothing beyond eid was resolved.
    let filter_rows = options.remove_empty && selection.len() > 1;

    let mut total_rows: u64 = 0;
    let mut wrote_any = false;
    for batch_result in reader {
        let batch = batch_result.map_err(|e| BiotabError::from(e).in_stage("parquet read"))?;
        let mut batch = reorder_columns(&batch, Arc::clone(&out_schema))?;
        if filter_rows {
            batch = filter::filter_empty_rows(&batch, 1)?;
        }
        total_rows += batch.num_rows() as u64;
        writer
            .write(&batch)
            .map_err(|e| BiotabError::from(e).in_stage("csv write"))?;
        wrote_any = true;
    }

    // A rowless input still gets a header line.
    if !wrote_any {
        writer
            .write(&RecordBatch::new_empty(out_schema))
            .map_err(|e| BiotabError::from(e).in_stage("csv write"))?;
    }

    Ok(total_rows)
}

/// Builds the output schema holding the selected fields in selection order.
fn selection_schema(schema: &SchemaRef, selection: &[String]) -> Result<SchemaRef, BiotabError> {
    let fields = selection
        .iter()
        .map(|name| {
            schema
                .fields()
                .iter()
                .find(|f| f.name() == name)
                .cloned()
                .ok_or_else(|| {
                    BiotabError::Internal(format!("selected column '{name}' vanished from schema"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Arc::new(Schema::new(fields)))
}

/// Reorders a projected batch's columns into selection order (eid first).
fn reorder_columns(batch: &RecordBatch, out_schema: SchemaRef) -> Result<RecordBatch, BiotabError> {
    let columns = out_schema
        .fields()
        .iter()
        .map(|field| {
            batch.column_by_name(field.name()).cloned().ok_or_else(|| {
                BiotabError::Internal(format!(
                    "projected batch is missing column '{}'",
                    field.name()
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RecordBatch::try_new(out_schema, columns)?)
}

//! The converter pipeline: delimited text in, compressed Parquet out.
//!
//! The source file is scanned lazily and streamed in a single pass into the
//! Parquet sink. Type and date inference runs on a bounded sample of rows,
//! never the whole file, and the configured row-group size caps how many rows
//! are buffered together at any point. Output is written to a sibling temp
//! file and renamed into place so a failed run never leaves a half-written
//! destination behind.

use std::fs::{self, File};
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::SchemaRef;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::config::{ConvertConfig, SinkMode};
use crate::error::BiotabError;

pub mod chunking;

//==================================================================================
// 1. Public API
//==================================================================================

/// Converts a delimited text file with a header row into a Parquet file.
///
/// Missing input fails with [`BiotabError::NotFound`]; missing parent
/// directories of `output` are created. Any downstream engine failure is
/// wrapped into [`BiotabError::ConversionFailure`] carrying the stage it
/// occurred in.
pub fn convert(input: &Path, output: &Path, config: &ConvertConfig) -> Result<(), BiotabError> {
    config.validate()?;

    if !input.exists() {
        return Err(BiotabError::NotFound(input.to_path_buf()));
    }
    ensure_parent_dir(output)?;

    // 1. Infer the schema from a bounded sample, then rewind for the real pass.
    let mut source = File::open(input)?;
    let format = Format::default()
        .with_header(true)
        .with_delimiter(config.delimiter as u8)
        .with_truncated_rows(true);
    let (schema, _) = format
        .infer_schema(&mut source, Some(config.infer_sample_rows))
        .map_err(|e| BiotabError::from(e).in_stage("schema inference"))?;
    source.rewind()?;
    let schema: SchemaRef = Arc::new(schema);

    // 2. Resolve the tuning knobs now that the column count is known.
    let chunk_size = chunking::resolve_chunk_size(config, schema.fields().len())?;
    let buffered = should_buffer(config.sink_mode, input)?;
    log::debug!(
        "converting {} with {} column(s), row groups of {chunk_size}, {} sink, thread hint {}",
        input.display(),
        schema.fields().len(),
        if buffered { "buffered" } else { "streaming" },
        config.effective_threads(),
    );

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .with_batch_size(chunk_size)
        .build(source)
        .map_err(|e| BiotabError::from(e).in_stage("text decode"))?;

    // 3. Stream into the sink behind a temp file; never leave a torn output.
    let tmp = temp_output_path(output);
    let result = write_parquet(reader, &tmp, Arc::clone(&schema), config, chunk_size, buffered);
    match result {
        Ok(total_rows) => {
            fs::rename(&tmp, output)?;
            log::info!(
                "converted {} rows x {} columns into {} ({} compression)",
                total_rows,
                schema.fields().len(),
                output.display(),
                config.compression,
            );
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

//==================================================================================
// 2. Sink Internals
//==================================================================================

fn write_parquet(
    reader: impl Iterator<Item = Result<arrow::record_batch::RecordBatch, arrow::error::ArrowError>>,
    tmp: &Path,
    schema: SchemaRef,
    config: &ConvertConfig,
    chunk_size: usize,
    buffered: bool,
) -> Result<u64, BiotabError> {
    let props = WriterProperties::builder()
        .set_compression(config.compression.to_parquet())
        .set_max_row_group_size(chunk_size)
        .build();

    let sink = File::create(tmp)?;
    let mut writer = ArrowWriter::try_new(sink, schema, Some(props))
        .map_err(|e| BiotabError::from(e).in_stage("parquet open"))?;

    let mut total_rows: u64 = 0;
    if buffered {
        // Small-file path: materialize first so the whole file lands in as
        // few row groups as the chunk size allows.
        let batches = reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BiotabError::from(e).in_stage("text decode"))?;
        for batch in &batches {
            total_rows += batch.num_rows() as u64;
            writer
                .write(batch)
                .map_err(|e| BiotabError::from(e).in_stage("parquet write"))?;
        }
    } else {
        for batch_result in reader {
            let batch = batch_result.map_err(|e| BiotabError::from(e).in_stage("text decode"))?;
            total_rows += batch.num_rows() as u64;
            writer
                .write(&batch)
                .map_err(|e| BiotabError::from(e).in_stage("parquet write"))?;
        }
    }

    writer
        .close()
        .map_err(|e| BiotabError::from(e).in_stage("parquet finalize"))?;
    Ok(total_rows)
}

fn should_buffer(mode: SinkMode, input: &Path) -> Result<bool, BiotabError> {
    Ok(match mode {
        SinkMode::Streaming => false,
        SinkMode::Buffered => true,
        SinkMode::Auto => fs::metadata(input)?.len() < chunking::SMALL_FILE_THRESHOLD_BYTES,
    })
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), BiotabError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Sibling temp path used for atomic write-then-rename.
pub(crate) fn temp_output_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::io::Write;

    fn write_fixture(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("input.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert(
            Path::new("/nonexistent/input.csv"),
            &dir.path().join("out.parquet"),
            &ConvertConfig::default(),
        );
        assert!(matches!(result, Err(BiotabError::NotFound(_))));
    }

    #[test]
    fn conversion_preserves_rows_and_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(
            dir.path(),
            "eid,31-0.0,21-0.0\n1000001,1,170.5\n1000002,0,\n1000003,1,182.0\n",
        );
        let output = dir.path().join("nested/out.parquet");

        convert(&input, &output, &ConvertConfig::default()).unwrap();

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&output).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();
        let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total_rows, 3);

        let names: Vec<String> = batches[0]
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, vec!["eid", "31-0.0", "21-0.0"]);
    }

    #[test]
    fn small_chunk_size_produces_multiple_row_groups() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = String::from("eid,31-0.0\n");
        for i in 0..10 {
            contents.push_str(&format!("{},{}\n", 1000000 + i, i % 2));
        }
        let input = write_fixture(dir.path(), &contents);
        let output = dir.path().join("out.parquet");

        let config = ConvertConfig {
            chunk_size_rows: 4,
            ..ConvertConfig::default()
        };
        convert(&input, &output, &config).unwrap();

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&output).unwrap()).unwrap();
        assert_eq!(builder.metadata().file_metadata().num_rows(), 10);
        assert!(builder.metadata().num_row_groups() >= 3);
    }

    #[test]
    fn ragged_trailing_columns_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        // Second data row is short one column; best-effort parsing keeps it.
        let input = write_fixture(dir.path(), "eid,31-0.0,21-0.0\n1,0,2.5\n2,1\n");
        let output = dir.path().join("out.parquet");

        convert(&input, &output, &ConvertConfig::default()).unwrap();

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&output).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let total_rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(total_rows, 2);
    }

    #[test]
    fn failed_conversion_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(dir.path(), "eid,31-0.0\n1,0\n");
        let output = dir.path().join("out.parquet");

        let config = ConvertConfig {
            chunk_size_rows: 0,
            ..ConvertConfig::default()
        };
        assert!(convert(&input, &output, &config).is_err());
        assert!(!temp_output_path(&output).exists());
        assert!(!output.exists());
    }

    #[test]
    fn temp_path_is_a_sibling_of_the_output() {
        let tmp = temp_output_path(Path::new("/data/out.parquet"));
        assert_eq!(tmp, Path::new("/data/out.parquet.tmp"));
    }
}

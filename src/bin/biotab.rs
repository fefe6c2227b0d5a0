//! Thin CLI over the biotab library: `convert` and `extract` subcommands.
//!
//! All real work happens in the library; this binary only parses arguments,
//! assembles configs, and reports outcomes. Any library error is printed and
//! the process exits non-zero.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use biotab::fields::read_field_ids;
use biotab::{convert, extract, BiotabError, CompressionCodec, ConvertConfig, ExtractOptions};

#[derive(Parser)]
#[command(name = "biotab", version = biotab::VERSION, about = "Biomedical tabular data processing tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a delimited text file to Parquet format.
    Convert {
        /// Input text file
        input: PathBuf,
        /// Output Parquet file
        output: PathBuf,
        /// Compression algorithm (zstd, snappy, gzip, none)
        #[arg(long, default_value = "zstd", conflicts_with = "config")]
        compression: CompressionCodec,
        /// Target rows per row group
        #[arg(long, default_value_t = 50_000, conflicts_with = "config")]
        chunk_size: usize,
        /// CPU-count hint passed to the columnar engine
        #[arg(long, conflicts_with = "config")]
        threads: Option<usize>,
        /// Derive the row-group size from this memory budget instead
        #[arg(long, conflicts_with = "config")]
        memory_budget_bytes: Option<u64>,
        /// Load the full conversion config from a JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Extract specified fields from a Parquet file.
    ///
    /// Fields can be given via --fields, --file, or both; both sources are
    /// combined and deduplicated.
    Extract {
        /// Input Parquet file
        input: PathBuf,
        /// Output text file
        output: PathBuf,
        /// Field IDs to extract
        #[arg(short = 'f', long = "fields")]
        fields: Vec<String>,
        /// Text file with one field ID per line
        #[arg(long = "file")]
        file: Option<PathBuf>,
        /// Remove rows where all extracted fields are empty
        #[arg(short = 'r', long = "remove-empty")]
        remove_empty: bool,
        /// Extract a specific instance only (e.g. "1.0", "2.0")
        #[arg(short = 'i', long = "instance")]
        instance: Option<String>,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("Error: {e}").red());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BiotabError> {
    match cli.command {
        Command::Convert {
            input,
            output,
            compression,
            chunk_size,
            threads,
            memory_budget_bytes,
            config,
        } => {
            let config = match config {
                Some(path) => {
                    let contents = std::fs::read_to_string(&path)
                        .map_err(|_| BiotabError::NotFound(path.clone()))?;
                    serde_json::from_str(&contents)?
                }
                None => ConvertConfig {
                    compression,
                    chunk_size_rows: chunk_size,
                    threads,
                    memory_budget_bytes,
                    ..ConvertConfig::default()
                },
            };

            convert(&input, &output, &config)?;
            println!(
                "{}",
                format!(
                    "✓ Successfully converted {} to {}",
                    input.display(),
                    output.display()
                )
                .green()
            );
            Ok(())
        }
        Command::Extract {
            input,
            output,
            fields,
            file,
            remove_empty,
            instance,
        } => {
            let options = ExtractOptions {
                field_ids: (!fields.is_empty()).then(|| fields.clone()),
                field_id_file: file.clone(),
                remove_empty,
                instance,
            };
            let processed = extract(&input, &output, &options)?;

            println!(
                "{}",
                format!("✓ Successfully extracted fields to {}", output.display()).green()
            );
            if !fields.is_empty() && file.is_some() {
                println!(
                    "\n{}",
                    "Note: Combined fields from both command line and file".yellow()
                );
            }

            let processed_line = processed.iter().cloned().collect::<Vec<_>>().join(" | ");
            println!("\n{} {processed_line}", "Processed fields:".bold());

            // Surface IDs requested through both channels.
            if let Some(file) = &file {
                if !fields.is_empty() {
                    let cmd_fields: BTreeSet<String> = fields.iter().cloned().collect();
                    let file_fields: BTreeSet<String> =
                        read_field_ids(file)?.into_iter().collect();
                    let overlap: Vec<String> =
                        cmd_fields.intersection(&file_fields).cloned().collect();
                    if !overlap.is_empty() {
                        println!("\n{} {}", "Duplicate fields:".yellow(), overlap.join(" | "));
                    }
                }
            }
            Ok(())
        }
    }
}

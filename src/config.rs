//! The single source of truth for all conversion configuration.
//!
//! This module defines the `ConvertConfig` struct, which is designed to be
//! created once at the application boundary (from CLI flags or a user's JSON
//! file) and then passed down through the converter pipeline by reference.
//!
//! Every knob here is a performance/memory tunable: none of them affects the
//! correctness of the written columnar file.

use std::fmt;
use std::str::FromStr;

use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use serde::{Deserialize, Serialize};

use crate::error::BiotabError;

/// Environment variable consulted for a CPU-count hint when
/// [`ConvertConfig::threads`] is left unset.
pub const THREADS_ENV_VAR: &str = "BIOTAB_NUM_THREADS";

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// The per-column compression codec applied to the columnar output.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    /// **Default:** modern entropy coder, best size/speed trade-off.
    #[default]
    Zstd,
    Snappy,
    Gzip,
    /// No compression. Useful for debugging or already-compressed payloads.
    Uncompressed,
}

impl CompressionCodec {
    /// Maps the codec onto the Parquet writer's compression setting.
    pub fn to_parquet(self) -> Compression {
        match self {
            CompressionCodec::Zstd => Compression::ZSTD(ZstdLevel::default()),
            CompressionCodec::Snappy => Compression::SNAPPY,
            CompressionCodec::Gzip => Compression::GZIP(GzipLevel::default()),
            CompressionCodec::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

impl FromStr for CompressionCodec {
    type Err = BiotabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zstd" => Ok(CompressionCodec::Zstd),
            "snappy" => Ok(CompressionCodec::Snappy),
            "gzip" => Ok(CompressionCodec::Gzip),
            "none" | "uncompressed" => Ok(CompressionCodec::Uncompressed),
            other => Err(BiotabError::InvalidArgument(format!(
                "unrecognized compression codec '{other}' (expected zstd, snappy, gzip, or none)"
            ))),
        }
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressionCodec::Zstd => "zstd",
            CompressionCodec::Snappy => "snappy",
            CompressionCodec::Gzip => "gzip",
            CompressionCodec::Uncompressed => "none",
        };
        f.write_str(name)
    }
}

/// Whether the converter streams batches straight into the writer or buffers
/// the whole file first. Buffering a small file produces a single tidy row
/// group; streaming keeps memory bounded for everything else.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SinkMode {
    /// **Default:** buffer files smaller than the small-file threshold,
    /// stream everything else.
    #[default]
    Auto,
    Streaming,
    Buffered,
}

//==================================================================================
// II. The Unified ConvertConfig
//==================================================================================

/// The unified configuration for a single conversion run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub struct ConvertConfig {
    /// The per-column compression codec.
    #[serde(default)]
    pub compression: CompressionCodec,

    /// **The target number of rows per row group.** Must be positive. Large
    /// batches compress better; small batches bound peak memory.
    #[serde(default = "default_chunk_size_rows")]
    pub chunk_size_rows: usize,

    /// Explicit CPU-count hint handed to the columnar engine. When `None`,
    /// [`THREADS_ENV_VAR`] is consulted, then 1. The hint never drives any
    /// orchestration in this crate.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Opt-in memory budget for row-group sizing. When set, the row-group
    /// size is estimated from this budget and the inferred column count
    /// instead of `chunk_size_rows`. A heuristic only; see
    /// `converter::chunking`.
    #[serde(default)]
    pub memory_budget_bytes: Option<u64>,

    /// Streaming-vs-buffered sink selection.
    #[serde(default)]
    pub sink_mode: SinkMode,

    /// Upper bound on the number of records scanned for type and date
    /// inference. Inference never reads the whole file.
    #[serde(default = "default_infer_sample_rows")]
    pub infer_sample_rows: usize,

    /// Field delimiter of the input text file.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            compression: CompressionCodec::default(),
            chunk_size_rows: default_chunk_size_rows(),
            threads: None,
            memory_budget_bytes: None,
            sink_mode: SinkMode::default(),
            infer_sample_rows: default_infer_sample_rows(),
            delimiter: default_delimiter(),
        }
    }
}

impl ConvertConfig {
    /// Rejects knob values that cannot produce a valid conversion.
    pub fn validate(&self) -> Result<(), BiotabError> {
        if self.chunk_size_rows == 0 {
            return Err(BiotabError::InvalidArgument(
                "chunk_size_rows must be a positive integer".to_string(),
            ));
        }
        if self.infer_sample_rows == 0 {
            return Err(BiotabError::InvalidArgument(
                "infer_sample_rows must be a positive integer".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(BiotabError::InvalidArgument(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )));
        }
        Ok(())
    }

    /// Resolves the CPU-count hint: explicit config value first, then the
    /// `BIOTAB_NUM_THREADS` environment variable, then single-threaded.
    pub fn effective_threads(&self) -> usize {
        self.threads
            .or_else(|| {
                std::env::var(THREADS_ENV_VAR)
                    .ok()
                    .and_then(|v| v.trim().parse::<usize>().ok())
            })
            .filter(|&n| n > 0)
            .unwrap_or(1)
    }
}

/// Helper for `serde` to provide a default for `chunk_size_rows`.
fn default_chunk_size_rows() -> usize {
    50_000
}

/// Helper for `serde` to provide a default for `infer_sample_rows`.
fn default_infer_sample_rows() -> usize {
    1_000
}

fn default_delimiter() -> char {
    ','
}

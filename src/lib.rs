//! biotab: streaming conversion of large biomedical tabular text files into
//! compressed Parquet, and field-level extraction back into text.
//!
//! Two independent pipelines composed around one column-naming convention:
//!
//! 1. [`convert`] scans a delimited text file lazily, infers a schema from a
//!    bounded sample, and streams it into a Parquet file in bounded-size row
//!    groups.
//! 2. [`extract`] resolves requested logical field IDs against a Parquet
//!    schema into the physical instance-qualified columns that encode them,
//!    optionally filters blank rows, and writes the selection back as text
//!    with the mandatory `eid` subject column always first.
//!
//! The [`fields`] module holds the field-ID parsing and column-matching rules
//! shared by both front ends.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod config;
pub mod converter;
pub mod extractor;
pub mod fields;

mod error;


//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use config::{CompressionCodec, ConvertConfig, SinkMode};
pub use converter::convert;
pub use error::BiotabError;
pub use extractor::{extract, ExtractOptions};

//! Row-group sizing heuristics for the converter.
//!
//! The row-group size is purely a memory/IO knob: it never affects the
//! correctness of the written file. Callers either fix it directly via
//! `chunk_size_rows` or hand the converter a memory budget and let
//! [`estimate_chunk_size`] derive a row count from the column count.

use crate::config::ConvertConfig;
use crate::error::BiotabError;

/// Rough per-cell cost of a decoded value sitting in an Arrow builder.
/// Deliberately pessimistic so the estimate errs toward smaller groups.
const EST_BYTES_PER_CELL: u64 = 16;

/// Lower clamp: below this, row-group overhead dominates.
pub const MIN_CHUNK_SIZE_ROWS: usize = 1_024;

/// Upper clamp: beyond this, larger groups stop paying for themselves.
pub const MAX_CHUNK_SIZE_ROWS: usize = 1_000_000;

/// Files smaller than this are buffered whole under `SinkMode::Auto`.
pub const SMALL_FILE_THRESHOLD_BYTES: u64 = 32 * 1024 * 1024;

/// Estimates a row-group size that keeps one in-flight batch of `num_columns`
/// columns inside `memory_budget_bytes`, clamped to a sane range.
pub fn estimate_chunk_size(memory_budget_bytes: u64, num_columns: usize) -> usize {
    let row_cost = EST_BYTES_PER_CELL * num_columns.max(1) as u64;
    let estimated = (memory_budget_bytes / row_cost) as usize;
    estimated.clamp(MIN_CHUNK_SIZE_ROWS, MAX_CHUNK_SIZE_ROWS)
}

/// Resolves the effective row-group size for a conversion: the memory-budget
/// estimate when a budget is configured, the fixed `chunk_size_rows` knob
/// otherwise.
pub fn resolve_chunk_size(
    config: &ConvertConfig,
    num_columns: usize,
) -> Result<usize, BiotabError> {
    let chunk_size = match config.memory_budget_bytes {
        Some(budget) => {
            let estimated = estimate_chunk_size(budget, num_columns);
            log::debug!(
                "estimated row-group size {estimated} from budget of {budget} bytes over {num_columns} column(s)"
            );
            estimated
        }
        None => config.chunk_size_rows,
    };

    if chunk_size == 0 {
        return Err(BiotabError::InvalidArgument(
            "resolved chunk size must be a positive integer".to_string(),
        ));
    }
    Ok(chunk_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_inversely_with_column_count() {
        let budget = 64 * 1024 * 1024;
        let narrow = estimate_chunk_size(budget, 10);
        let wide = estimate_chunk_size(budget, 10_000);
        assert!(narrow > wide);
    }

    #[test]
    fn estimate_is_clamped_on_both_ends() {
        assert_eq!(estimate_chunk_size(1, 10_000), MIN_CHUNK_SIZE_ROWS);
        assert_eq!(estimate_chunk_size(u64::MAX / 2, 1), MAX_CHUNK_SIZE_ROWS);
    }

    #[test]
    fn fixed_chunk_size_wins_without_a_budget() {
        let config = ConvertConfig {
            chunk_size_rows: 12_345,
            ..ConvertConfig::default()
        };
        assert_eq!(resolve_chunk_size(&config, 500).unwrap(), 12_345);
    }

    #[test]
    fn budget_overrides_fixed_chunk_size() {
        let config = ConvertConfig {
            chunk_size_rows: 50_000,
            memory_budget_bytes: Some(16 * 1024 * 1024),
            ..ConvertConfig::default()
        };
        let resolved = resolve_chunk_size(&config, 1_000).unwrap();
        assert_eq!(resolved, 16 * 1024 * 1024 / (16 * 1_000));
    }
}

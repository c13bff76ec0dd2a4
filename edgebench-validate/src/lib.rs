#![warn(missing_docs)]
//! Edgebench Correctness Validator
//!
//! Before two engines' timings are treated as comparable, their results must
//! be logically equivalent. This crate holds the comparison machinery:
//! - CSV result-set parsing
//! - Cell-level equality under numeric (relative/absolute) tolerance
//! - Temporal normalization: epoch seconds, epoch milliseconds, ISO-8601 and
//!   common date-time text all collapse to one epoch representation
//! - Pairwise, order-preserving result-set comparison with structural
//!   row-count checks and first-N difference retention
//!
//! A result *mismatch* is always a successfully computed comparison that
//! happens to report "different". Only an engine execution failure is fatal,
//! and that distinction is drawn by the caller driving the engines.

mod compare;
mod csv;
mod pair;

pub use compare::{
    cells_equal, compare_result_sets, normalize_timestamp, CellDiff, PairComparison, Tolerance,
};
pub use csv::parse_csv;
pub use pair::ValidationPair;

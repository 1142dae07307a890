//! Numstat parsing, path exclusion, and diff aggregation.
//!
//! Turns `git diff --numstat` output into inserted/deleted totals:
//! - [`numstat`]: the line-shape guard and the per-line parser
//! - [`filter`]: glob exclusion patterns
//! - [`source`]: the [`source::DiffSource`] port and its `git` implementation
//! - [`aggregate`]: the fail-open pipeline tying them together

pub mod aggregate;
pub mod filter;
pub mod numstat;
pub mod source;

//! Summing numstat output into [`DiffTotals`].
//!
//! The aggregator is fail-open: if the diff cannot be produced for any
//! reason the result is zero totals, never an error. Callers always get
//! something they can display.

use std::path::Path;

use nanny_core::DiffTotals;

use crate::filter::ExcludeSet;
use crate::numstat::{is_stat_line, parse_stat_line};
use crate::source::DiffSource;

/// Totals plus how many files went into them.
///
/// # Examples
///
/// ```
/// use nanny_core::DiffTotals;
/// use nanny_difflens::aggregate::Tally;
///
/// let tally = Tally::default();
/// assert_eq!(tally.totals, DiffTotals::default());
/// assert_eq!(tally.files_counted, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub totals: DiffTotals,
    /// Stat lines that contributed to `totals`.
    pub files_counted: usize,
    /// Stat lines dropped by an exclusion pattern.
    pub files_excluded: usize,
}

/// Sum raw numstat text, skipping malformed lines and excluded paths.
///
/// # Examples
///
/// ```
/// use nanny_core::DiffTotals;
/// use nanny_difflens::aggregate::sum_numstat;
/// use nanny_difflens::filter::ExcludeSet;
///
/// let output = "10\t2\tfile1.ts\n0\t0\tfile2.lock\n-\t-\timg.png\n";
/// let excludes = ExcludeSet::new(["*.lock"]).unwrap();
/// let tally = sum_numstat(output, &excludes);
/// assert_eq!(tally.totals, DiffTotals::new(10, 2));
/// assert_eq!(tally.files_excluded, 1);
/// ```
pub fn sum_numstat(output: &str, excludes: &ExcludeSet) -> Tally {
    let mut tally = Tally::default();

    for line in output.lines().filter(|line| is_stat_line(line)) {
        let stat = parse_stat_line(line);
        let path = stat.target_path();

        if let Some(pattern) = excludes.matching_pattern(&path) {
            tracing::trace!(%path, pattern, "excluded");
            tally.files_excluded += 1;
            continue;
        }

        match stat.counts() {
            Some((inserted, deleted)) => {
                tally.totals += DiffTotals::new(inserted, deleted);
                tally.files_counted += 1;
            }
            None => tracing::debug!(line, "skipping stat line with unparseable counts"),
        }
    }

    tally
}

/// Run the diff for `workdir` and sum it.
///
/// Errors from `source` are logged and turned into zero totals.
#[tracing::instrument(level = "debug", skip_all, fields(workdir = %workdir.display(), base = ?base))]
pub async fn aggregate(
    source: &dyn DiffSource,
    workdir: &Path,
    excludes: &ExcludeSet,
    base: Option<&str>,
) -> Tally {
    match source.numstat(workdir, base).await {
        Ok(output) => {
            let tally = sum_numstat(&output, excludes);
            tracing::debug!(
                inserted = tally.totals.inserted,
                deleted = tally.totals.deleted,
                counted = tally.files_counted,
                excluded = tally.files_excluded,
                "diff aggregated"
            );
            tally
        }
        Err(e) => {
            tracing::debug!(error = %e, "diff unavailable, reporting zero changes");
            Tally::default()
        }
    }
}

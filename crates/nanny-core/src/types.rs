use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::threshold::{LimitStatus, Limits};

/// Inserted and deleted line counts summed over the counted files.
///
/// Sums saturate at `u64::MAX` instead of wrapping.
///
/// # Examples
///
/// ```
/// use nanny_core::DiffTotals;
///
/// let totals = DiffTotals::new(10, 2);
/// assert_eq!(totals.total(), 12);
/// assert_eq!(totals.to_string(), "+10 | -2");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffTotals {
    /// Lines inserted.
    pub inserted: u64,
    /// Lines deleted.
    pub deleted: u64,
}

impl DiffTotals {
    pub fn new(inserted: u64, deleted: u64) -> Self {
        Self { inserted, deleted }
    }

    /// Inserted plus deleted, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.inserted.saturating_add(self.deleted)
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.deleted == 0
    }
}

impl std::ops::Add for DiffTotals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            inserted: self.inserted.saturating_add(other.inserted),
            deleted: self.deleted.saturating_add(other.deleted),
        }
    }
}

impl std::ops::AddAssign for DiffTotals {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl fmt::Display for DiffTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} | -{}", self.inserted, self.deleted)
    }
}

/// The outcome of one completed run, as handed to the presentation layer.
///
/// # Examples
///
/// ```
/// use nanny_core::{DiffReport, DiffTotals, Limit, Limits};
///
/// let limits = Limits { max_total: Limit::at_most(5), ..Limits::default() };
/// let report = DiffReport::new(DiffTotals::new(10, 2), &limits);
/// assert!(report.is_warning());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    /// Summed counts over the non-excluded files.
    pub totals: DiffTotals,
    /// Which limits the totals exceed.
    pub status: LimitStatus,
    /// Number of stat lines that contributed to the totals.
    pub files_counted: usize,
    /// Number of stat lines dropped by exclusion patterns.
    pub files_excluded: usize,
    /// Reference the working tree was compared against, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

impl DiffReport {
    /// Build a report by evaluating `totals` against `limits`.
    pub fn new(totals: DiffTotals, limits: &Limits) -> Self {
        Self {
            totals,
            status: limits.evaluate(&totals),
            ..Self::default()
        }
    }

    /// Whether any configured limit is exceeded.
    pub fn is_warning(&self) -> bool {
        self.status.is_hit()
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Short human-readable label.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DiffTotals;

/// An upper bound on a line count, or no bound at all.
///
/// Configuration spells "no bound" as `-1`; any negative number is treated
/// the same way.
///
/// # Examples
///
/// ```
/// use nanny_core::Limit;
///
/// assert!(Limit::from(-1).is_unlimited());
/// assert!(Limit::at_most(10).is_exceeded_by(11));
/// assert!(!Limit::at_most(10).is_exceeded_by(10));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Limit(Option<u64>);

impl Limit {
    /// No bound.
    pub const UNLIMITED: Limit = Limit(None);

    /// A bound of `max` lines.
    pub fn at_most(max: u64) -> Self {
        Self(Some(max))
    }

    /// Whether this limit never triggers.
    pub fn is_unlimited(self) -> bool {
        self.0.is_none()
    }

    /// The configured maximum, if any.
    pub fn max(self) -> Option<u64> {
        self.0
    }

    /// `true` when the limit is bounded and `value` strictly exceeds it.
    pub fn is_exceeded_by(self, value: u64) -> bool {
        matches!(self.0, Some(max) if value > max)
    }
}

impl From<i64> for Limit {
    fn from(raw: i64) -> Self {
        u64::try_from(raw).map_or(Limit::UNLIMITED, Limit::at_most)
    }
}

impl From<Limit> for i64 {
    fn from(limit: Limit) -> Self {
        match limit.0 {
            Some(max) => i64::try_from(max).unwrap_or(i64::MAX),
            None => -1,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(max) => write!(f, "{max}"),
            None => write!(f, "unlimited"),
        }
    }
}

/// The three configured maxima.
///
/// # Examples
///
/// ```
/// use nanny_core::{DiffTotals, Limit, Limits};
///
/// let limits = Limits {
///     max_total: Limit::at_most(5),
///     ..Limits::default()
/// };
/// let status = limits.evaluate(&DiffTotals::new(10, 2));
/// assert!(status.total);
/// assert!(status.is_hit());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    /// Maximum of inserted + deleted lines.
    pub max_total: Limit,
    /// Maximum of inserted lines.
    pub max_inserts: Limit,
    /// Maximum of deleted lines.
    pub max_removals: Limit,
}

impl Limits {
    /// Check every dimension of `totals` against its limit.
    pub fn evaluate(&self, totals: &DiffTotals) -> LimitStatus {
        LimitStatus {
            total: self.max_total.is_exceeded_by(totals.total()),
            inserts: self.max_inserts.is_exceeded_by(totals.inserted),
            removals: self.max_removals.is_exceeded_by(totals.deleted),
        }
    }

    /// Whether no dimension is bounded.
    pub fn is_unlimited(&self) -> bool {
        self.max_total.is_unlimited()
            && self.max_inserts.is_unlimited()
            && self.max_removals.is_unlimited()
    }
}

/// Which limits a set of totals exceeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitStatus {
    /// Inserted + deleted exceeds `max_total`.
    pub total: bool,
    /// Inserted exceeds `max_inserts`.
    pub inserts: bool,
    /// Deleted exceeds `max_removals`.
    pub removals: bool,
}

impl LimitStatus {
    /// The warning flag: any limit hit.
    pub fn is_hit(&self) -> bool {
        self.total || self.inserts || self.removals
    }
}

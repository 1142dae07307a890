//! The live status shown to the user.
//!
//! There is exactly one [`StatusIndicator`] per session. It is created by
//! the caller and handed to whoever produces reports; nothing here is
//! global.

use std::sync::{Mutex, MutexGuard};

use nanny_core::DiffReport;

/// Identifies one run. Later runs get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct State {
    issued: u64,
    applied: Option<RunTicket>,
    report: DiffReport,
}

/// Holds the most recent report and rejects stale ones.
///
/// Each run takes a ticket with [`StatusIndicator::begin`] before it
/// starts and hands it back with its result. A result is shown only if no
/// later-started run has been shown already, so a slow run can never
/// overwrite a newer one.
///
/// # Examples
///
/// ```
/// use nanny_core::{DiffReport, DiffTotals, Limits};
/// use nanny_watch::StatusIndicator;
///
/// let indicator = StatusIndicator::new();
/// let slow = indicator.begin();
/// let fast = indicator.begin();
///
/// assert!(indicator.publish(fast, DiffReport::new(DiffTotals::new(5, 1), &Limits::default())));
/// assert!(!indicator.publish(slow, DiffReport::new(DiffTotals::new(1, 0), &Limits::default())));
/// assert_eq!(indicator.label(), "+5 | -1");
/// ```
#[derive(Debug, Default)]
pub struct StatusIndicator {
    state: Mutex<State>,
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a ticket for a run that is about to start.
    pub fn begin(&self) -> RunTicket {
        let mut state = self.lock();
        state.issued += 1;
        RunTicket(state.issued)
    }

    /// Show `report` unless a later-started run is already shown.
    ///
    /// Returns whether the report was applied.
    pub fn publish(&self, ticket: RunTicket, report: DiffReport) -> bool {
        let mut state = self.lock();
        if state.applied.is_some_and(|applied| applied >= ticket) {
            tracing::debug!(
                ticket = ticket.sequence(),
                "dropping stale report"
            );
            return false;
        }
        state.applied = Some(ticket);
        state.report = report;
        true
    }

    /// The report currently shown. Zero totals before the first run.
    pub fn current(&self) -> DiffReport {
        self.lock().report.clone()
    }

    /// `+inserted | -deleted` for the current report.
    pub fn label(&self) -> String {
        self.lock().report.totals.to_string()
    }

    /// Whether the current report exceeds a limit.
    pub fn is_warning(&self) -> bool {
        self.lock().report.is_warning()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every update is a single assignment, so a poisoned state is still whole.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanny_core::{DiffTotals, Limit, Limits};

    fn report(inserted: u64, deleted: u64) -> DiffReport {
        DiffReport::new(DiffTotals::new(inserted, deleted), &Limits::default())
    }

    #[test]
    fn starts_with_zero_totals() {
        let indicator = StatusIndicator::new();
        assert_eq!(indicator.label(), "+0 | -0");
        assert!(!indicator.is_warning());
    }

    #[test]
    fn tickets_increase() {
        let indicator = StatusIndicator::new();
        let a = indicator.begin();
        let b = indicator.begin();
        assert!(b > a);
        assert_eq!(b.sequence(), a.sequence() + 1);
    }

    #[test]
    fn in_order_results_all_apply() {
        let indicator = StatusIndicator::new();
        let first = indicator.begin();
        assert!(indicator.publish(first, report(1, 1)));
        let second = indicator.begin();
        assert!(indicator.publish(second, report(2, 2)));
        assert_eq!(indicator.current().totals, DiffTotals::new(2, 2));
    }

    #[test]
    fn stale_result_is_dropped() {
        let indicator = StatusIndicator::new();
        let old = indicator.begin();
        let new = indicator.begin();
        assert!(indicator.publish(new, report(9, 0)));
        assert!(!indicator.publish(old, report(1, 0)));
        assert_eq!(indicator.current().totals, DiffTotals::new(9, 0));
    }

    #[test]
    fn same_ticket_cannot_publish_twice() {
        let indicator = StatusIndicator::new();
        let ticket = indicator.begin();
        assert!(indicator.publish(ticket, report(1, 0)));
        assert!(!indicator.publish(ticket, report(2, 0)));
    }

    #[test]
    fn warning_follows_report() {
        let indicator = StatusIndicator::new();
        let limits = Limits {
            max_removals: Limit::at_most(3),
            ..Limits::default()
        };
        let ticket = indicator.begin();
        indicator.publish(ticket, DiffReport::new(DiffTotals::new(0, 4), &limits));
        assert!(indicator.is_warning());

        let ticket = indicator.begin();
        indicator.publish(ticket, DiffReport::new(DiffTotals::new(0, 3), &limits));
        assert!(!indicator.is_warning());
    }
}

//! Relevance matching between an information request and a stored income
//! document.
//!
//! The decision is anchored on the employer period when the requester asked
//! for one, and on the income/reimbursement dates when it did not; the two
//! branches never both apply to the same request.

use chrono::NaiveDate;

use super::document::IncomeDocument;
use super::domain::{InformationRequest, Period};

/// A first absence day this many days or more past the end of the employer
/// period no longer identifies it, unless the reduction reason says such a
/// gap is expected.
const MAX_DAYS_BETWEEN_EMPLOYER_PERIOD_AND_FIRST_ABSENCE: i64 = 20;

impl InformationRequest {
    /// Decides whether a previously received document answers this request.
    /// Total over well-formed inputs; absent optional fields select their own
    /// branch rather than failing.
    pub fn is_document_relevant(&self, document: &IncomeDocument) -> bool {
        if document.is_portal_submission() {
            return false;
        }
        self.relevant_for_employer_period(document)
            || self.relevant_for_income_or_reimbursement(document)
    }

    fn relevant_for_employer_period(&self, document: &IncomeDocument) -> bool {
        if !self.requires_employer_period {
            return false;
        }
        self.applies_to_employer_period(document)
    }

    fn applies_to_employer_period(&self, document: &IncomeDocument) -> bool {
        let reduced_payment = document.reduced_payment_reason.is_some();

        let last_day = match document.last_employer_period_end() {
            Some(last_day) => last_day,
            None => {
                // No employer period and full payment: the document does not
                // concern the employer period at all.
                if !reduced_payment {
                    return false;
                }
                // A reduction reason without an anchor date is not
                // interpretable.
                return match document.first_absence_day {
                    Some(first_absence) => self.matches_request_window_day(first_absence),
                    None => false,
                };
            }
        };

        // The first absence day only speaks for the employer period when it
        // comes after it, and then only within the distance limit.
        if let Some(first_absence) = document.first_absence_day {
            if first_absence > last_day {
                let days_between = (first_absence - last_day).num_days();
                if !document.allows_large_gap()
                    && days_between >= MAX_DAYS_BETWEEN_EMPLOYER_PERIOD_AND_FIRST_ABSENCE
                {
                    return false;
                }
                if self.matches_request_window_day(first_absence) {
                    return true;
                }
            }
        }

        document
            .employer_periods
            .iter()
            .any(|period| self.matches_request_window(period))
    }

    fn relevant_for_income_or_reimbursement(&self, document: &IncomeDocument) -> bool {
        if self.requires_employer_period {
            return false;
        }

        // The first absence day takes precedence when it lies after the
        // employer period; a first absence day inside the employer period is
        // superseded by the period's end.
        let last_day = document.last_employer_period_end();
        let candidate = document
            .first_absence_day
            .filter(|first_absence| last_day.map(|last| *first_absence > last).unwrap_or(true))
            .or(last_day);
        let date = match candidate {
            Some(date) => date,
            None => return false,
        };

        // The date must literally fall inside a reported absence window or
        // equal the request's own first absence day; lining up with a window
        // boundary is not enough in this branch.
        self.own_first_absence_day()
            .map(|entry| entry.date == date)
            .unwrap_or(false)
            || self.sick_leave_periods.iter().any(|p| p.contains(date))
            || self.self_certified_periods.iter().any(|p| p.contains(date))
    }

    fn matches_request_window_day(&self, date: NaiveDate) -> bool {
        self.matches_request_window(&Period::day(date))
    }

    /// True when the given document period overlaps, or is working-day
    /// adjacent to, any date the request is anchored on.
    fn matches_request_window(&self, period: &Period) -> bool {
        self.own_first_absence_day()
            .map(|entry| Period::day(entry.date).overlaps_or_adjacent(period))
            .unwrap_or(false)
            || self
                .sick_leave_periods
                .iter()
                .any(|p| p.overlaps_or_adjacent(period))
            || self
                .self_certified_periods
                .iter()
                .any(|p| p.overlaps_or_adjacent(period))
    }
}

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive calendar-day range with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Period {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        debug_assert!(from <= to, "period start must not be after its end");
        Self { from, to }
    }

    /// Single-day period.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        self.from.max(other.from) <= self.to.min(other.to)
    }

    /// Plain inclusive containment, no calendar extension.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// True when `other` overlaps this period or ends on the working day
    /// right before it. Periods are reported in calendar days while the pay
    /// obligation runs in working days, so a period ending Friday counts as
    /// continuous with one starting the following Monday.
    pub fn overlaps_or_adjacent(&self, other: &Period) -> bool {
        let extension = match other.to.weekday() {
            Weekday::Fri => 3,
            Weekday::Sat => 2,
            _ => 1,
        };
        let extended = Period {
            from: other.from,
            to: other.to + Days::new(extension),
        };
        self.overlaps(&extended)
    }

    pub fn overlaps_or_adjacent_day(&self, date: NaiveDate) -> bool {
        self.overlaps_or_adjacent(&Period::day(date))
    }
}

/// First day of work absence as stated on the request, one entry per
/// employer the request knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstAbsenceDay {
    pub employer_id: String,
    pub date: NaiveDate,
}

/// Normalized request for employer-supplied information about one
/// person/employer pair. Built once per inbound message and never mutated;
/// the relevance predicate lives in the `relevance` module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InformationRequest {
    pub subject_id: String,
    pub employer_id: String,
    pub case_id: Uuid,
    /// First day of the qualifying period. Carried for identity and logging;
    /// the relevance decision does not branch on it.
    pub period_start: NaiveDate,
    pub first_absence_days: Vec<FirstAbsenceDay>,
    pub sick_leave_periods: Vec<Period>,
    pub self_certified_periods: Vec<Period>,
    /// Whether the requester asked specifically for employer-period
    /// information.
    pub requires_employer_period: bool,
}

impl InformationRequest {
    /// The entry registered for the requesting employer itself. A request
    /// may name several employers; at most one entry is expected to match.
    pub fn own_first_absence_day(&self) -> Option<&FirstAbsenceDay> {
        self.first_absence_days
            .iter()
            .find(|entry| entry.employer_id == self.employer_id)
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::Period;

/// Sender systems of the self-service portal. Documents submitted there are
/// already visible to the requester through another channel and are never
/// replayed.
pub const PORTAL_SENDER_SYSTEMS: [&str; 2] = ["NAV_NO", "NAV_NO_SELVBESTEMT"];

/// Reduction reasons under which the distance between the employer period
/// and the first absence day may legitimately exceed the usual limit.
pub(crate) const LARGE_GAP_REASONS: [&str; 2] = ["FerieEllerAvspasering", "TidligereVirksomhet"];

/// The slice of the externally owned income-document contract that relevance
/// matching reads. Payloads carry many more fields; unknown ones are ignored
/// on decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomeDocument {
    /// Spans during which the employer bears pay obligations before the
    /// public benefit begins. May be empty.
    #[serde(default)]
    pub employer_periods: Vec<Period>,
    #[serde(default)]
    pub first_absence_day: Option<NaiveDate>,
    /// Code the payer supplies when disbursement was reduced or withheld,
    /// e.g. "Ferie" or "FerieEllerAvspasering".
    #[serde(default)]
    pub reduced_payment_reason: Option<String>,
    #[serde(default)]
    pub sender_system: Option<String>,
}

impl IncomeDocument {
    pub fn last_employer_period_end(&self) -> Option<NaiveDate> {
        self.employer_periods.iter().map(|period| period.to).max()
    }

    pub fn is_portal_submission(&self) -> bool {
        self.sender_system
            .as_deref()
            .map(|name| PORTAL_SENDER_SYSTEMS.contains(&name))
            .unwrap_or(false)
    }

    pub(crate) fn allows_large_gap(&self) -> bool {
        self.reduced_payment_reason
            .as_deref()
            .map(|reason| LARGE_GAP_REASONS.contains(&reason))
            .unwrap_or(false)
    }
}

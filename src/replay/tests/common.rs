use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::replay::document::IncomeDocument;
use crate::replay::domain::{FirstAbsenceDay, InformationRequest, Period};
use crate::replay::memory::InMemoryDocumentStore;
use crate::replay::repository::{
    DocumentStore, NewDocument, NewReplayBatch, PublishError, ReplayPublisher, ReplayReply,
    StoreError, StoredDocument,
};
use crate::replay::router::replay_router;
use crate::replay::service::ReplayService;

pub(super) const SUBJECT: &str = "12345678911";
pub(super) const EMPLOYER: &str = "987654321";
pub(super) const OTHER_EMPLOYER: &str = "112233445";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn period(from: NaiveDate, to: NaiveDate) -> Period {
    Period::new(from, to)
}

pub(super) fn request(
    period_start: NaiveDate,
    first_absence_day: NaiveDate,
    sick_leave_periods: Vec<Period>,
    self_certified_periods: Vec<Period>,
    requires_employer_period: bool,
) -> InformationRequest {
    InformationRequest {
        subject_id: SUBJECT.to_string(),
        employer_id: EMPLOYER.to_string(),
        case_id: Uuid::new_v4(),
        period_start,
        first_absence_days: vec![FirstAbsenceDay {
            employer_id: EMPLOYER.to_string(),
            date: first_absence_day,
        }],
        sick_leave_periods,
        self_certified_periods,
        requires_employer_period,
    }
}

pub(super) fn document(
    employer_periods: Vec<Period>,
    first_absence_day: Option<NaiveDate>,
    reduced_payment_reason: Option<&str>,
) -> IncomeDocument {
    IncomeDocument {
        employer_periods,
        first_absence_day,
        reduced_payment_reason: reduced_payment_reason.map(str::to_string),
        sender_system: Some("LPS".to_string()),
    }
}

pub(super) fn portal_document(sender_system: &str) -> IncomeDocument {
    IncomeDocument {
        sender_system: Some(sender_system.to_string()),
        ..document(
            vec![period(date(2018, 1, 1), date(2018, 1, 16))],
            Some(date(2018, 1, 1)),
            None,
        )
    }
}

pub(super) fn new_document(internal_id: Uuid, document: &IncomeDocument) -> NewDocument {
    NewDocument {
        subject_id: SUBJECT.to_string(),
        employer_id: Some(EMPLOYER.to_string()),
        external_id: Uuid::new_v4(),
        internal_id,
        submitted_at: Utc::now(),
        sender_system: document.sender_system.clone(),
        first_absence_day: document.first_absence_day,
        income_reference_date: None,
        payload: serde_json::to_string(document).expect("document serializes"),
    }
}

pub(super) fn build_service() -> (
    ReplayService<InMemoryDocumentStore, MemoryPublisher>,
    Arc<InMemoryDocumentStore>,
    Arc<MemoryPublisher>,
) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let publisher = Arc::new(MemoryPublisher::default());
    let service = ReplayService::new(store.clone(), publisher.clone());
    (service, store, publisher)
}

pub(super) fn replay_router_with_service(
    service: ReplayService<InMemoryDocumentStore, MemoryPublisher>,
) -> axum::Router {
    replay_router(Arc::new(service))
}

#[derive(Default)]
pub(super) struct MemoryPublisher {
    replies: Mutex<Vec<ReplayReply>>,
}

impl MemoryPublisher {
    pub(super) fn replies(&self) -> Vec<ReplayReply> {
        self.replies.lock().expect("publisher mutex poisoned").clone()
    }
}

impl ReplayPublisher for MemoryPublisher {
    fn publish(&self, reply: &ReplayReply) -> Result<(), PublishError> {
        self.replies
            .lock()
            .expect("publisher mutex poisoned")
            .push(reply.clone());
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl DocumentStore for UnavailableStore {
    fn insert_document(&self, _document: NewDocument) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn record_consumption(
        &self,
        _internal_id: Uuid,
        _subject_id: &str,
        _case_id: Uuid,
        _consumed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn unconsumed_documents(
        &self,
        _subject_id: &str,
        _employer_id: &str,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn create_replay_batch(&self, _batch: NewReplayBatch) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::domain::{FirstAbsenceDay, InformationRequest, Period};
use super::repository::{DocumentStore, NewDocument, ReplayPublisher};
use super::service::{ReplayService, ReplayServiceError};

/// Information-type tag marking a request for employer-period data.
pub const EMPLOYER_PERIOD_TAG: &str = "EmployerPeriod";

/// Router exposing the event intake endpoints. The message-bus bridge
/// delivers schema-validated events to these routes; a body that fails to
/// deserialize is rejected and dropped, never retried.
pub fn replay_router<S, P>(service: Arc<ReplayService<S, P>>) -> Router
where
    S: DocumentStore + 'static,
    P: ReplayPublisher + 'static,
{
    Router::new()
        .route("/api/v1/documents", post(document_registered_handler::<S, P>))
        .route(
            "/api/v1/documents/consumed",
            post(document_consumed_handler::<S, P>),
        )
        .route(
            "/api/v1/replay-requests",
            post(replay_request_handler::<S, P>),
        )
        .with_state(service)
}

/// Document-registered event payload.
#[derive(Debug, Deserialize)]
pub struct DocumentRegisteredBody {
    pub subject_id: String,
    #[serde(default)]
    pub employer_id: Option<String>,
    pub external_id: Uuid,
    pub internal_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub sender_system: Option<String>,
    #[serde(default)]
    pub first_absence_day: Option<NaiveDate>,
    #[serde(default)]
    pub income_reference_date: Option<NaiveDate>,
    /// Full document payload, opaque to this service beyond the contract
    /// fields; stored verbatim.
    pub document: serde_json::Value,
}

/// Document-consumed event payload.
#[derive(Debug, Deserialize)]
pub struct DocumentConsumedBody {
    pub internal_id: Uuid,
    pub subject_id: String,
    pub case_id: Uuid,
    pub consumed_at: DateTime<Utc>,
}

/// Replay-request event payload. Producers either state the employer-period
/// requirement directly or send the list of requested information types; one
/// of the two shapes must be present.
#[derive(Debug, Deserialize)]
pub struct ReplayRequestBody {
    pub subject_id: String,
    pub employer_id: String,
    pub case_id: Uuid,
    pub period_start: NaiveDate,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub first_absence_days: Vec<FirstAbsenceDay>,
    #[serde(default)]
    pub sick_leave_periods: Vec<Period>,
    #[serde(default)]
    pub self_certified_periods: Vec<Period>,
    #[serde(default)]
    pub requires_employer_period: Option<bool>,
    #[serde(default)]
    pub requested_information: Option<Vec<String>>,
}

impl ReplayRequestBody {
    /// The explicit boolean wins over the tag list when both are sent.
    fn resolve_requires_employer_period(&self) -> Option<bool> {
        if let Some(explicit) = self.requires_employer_period {
            return Some(explicit);
        }
        self.requested_information
            .as_ref()
            .map(|tags| tags.iter().any(|tag| tag == EMPLOYER_PERIOD_TAG))
    }

    fn into_request(self) -> Option<(InformationRequest, DateTime<Utc>)> {
        let requires_employer_period = self.resolve_requires_employer_period()?;
        let request = InformationRequest {
            subject_id: self.subject_id,
            employer_id: self.employer_id,
            case_id: self.case_id,
            period_start: self.period_start,
            first_absence_days: self.first_absence_days,
            sick_leave_periods: self.sick_leave_periods,
            self_certified_periods: self.self_certified_periods,
            requires_employer_period,
        };
        Some((request, self.requested_at))
    }
}

pub(crate) async fn document_registered_handler<S, P>(
    State(service): State<Arc<ReplayService<S, P>>>,
    Json(body): Json<DocumentRegisteredBody>,
) -> Response
where
    S: DocumentStore + 'static,
    P: ReplayPublisher + 'static,
{
    let document = NewDocument {
        subject_id: body.subject_id,
        employer_id: body.employer_id,
        external_id: body.external_id,
        internal_id: body.internal_id,
        submitted_at: body.submitted_at,
        sender_system: body.sender_system,
        first_absence_day: body.first_absence_day,
        income_reference_date: body.income_reference_date,
        payload: body.document.to_string(),
    };
    match service.register_document(document) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn document_consumed_handler<S, P>(
    State(service): State<Arc<ReplayService<S, P>>>,
    Json(body): Json<DocumentConsumedBody>,
) -> Response
where
    S: DocumentStore + 'static,
    P: ReplayPublisher + 'static,
{
    match service.record_consumption(
        body.internal_id,
        &body.subject_id,
        body.case_id,
        body.consumed_at,
    ) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn replay_request_handler<S, P>(
    State(service): State<Arc<ReplayService<S, P>>>,
    Json(body): Json<ReplayRequestBody>,
) -> Response
where
    S: DocumentStore + 'static,
    P: ReplayPublisher + 'static,
{
    let (request, requested_at) = match body.into_request() {
        Some(resolved) => resolved,
        None => {
            let payload = json!({
                "error": "either requires_employer_period or requested_information must be present",
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
    };
    match service.replay_for_request(&request, requested_at) {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => service_error_response(error),
    }
}

fn service_error_response(error: ReplayServiceError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

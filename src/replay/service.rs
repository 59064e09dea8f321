use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::document::IncomeDocument;
use super::domain::InformationRequest;
use super::repository::{
    DocumentStore, NewDocument, NewReplayBatch, PublishError, ReplayPublisher, ReplayReply,
    ReplayedDocument, StoreError,
};

/// Upper bound on how many documents a single replay batch may carry.
pub const MAX_DOCUMENTS_PER_REPLAY: usize = 10;

/// Service composing the document store, the relevance predicate, and the
/// reply publisher. All operations are synchronous; the store and publisher
/// own whatever transaction or transport discipline they need.
pub struct ReplayService<S, P> {
    store: Arc<S>,
    publisher: Arc<P>,
}

impl<S, P> ReplayService<S, P>
where
    S: DocumentStore + 'static,
    P: ReplayPublisher + 'static,
{
    pub fn new(store: Arc<S>, publisher: Arc<P>) -> Self {
        Self { store, publisher }
    }

    /// Stores a newly registered document. Redelivery of a known internal id
    /// is a no-op.
    pub fn register_document(&self, document: NewDocument) -> Result<(), ReplayServiceError> {
        info!(internal_id = %document.internal_id, "registering income document");
        self.store.insert_document(document)?;
        Ok(())
    }

    /// Records that downstream case processing consumed a document.
    pub fn record_consumption(
        &self,
        internal_id: Uuid,
        subject_id: &str,
        case_id: Uuid,
        consumed_at: DateTime<Utc>,
    ) -> Result<(), ReplayServiceError> {
        info!(%internal_id, %case_id, "recording document consumption");
        self.store
            .record_consumption(internal_id, subject_id, case_id, consumed_at)?;
        Ok(())
    }

    /// Answers a replay request: evaluates every unconsumed document for the
    /// request's subject/employer pair, persists a batch for the relevant
    /// ones and publishes the reply event. An empty selection still produces
    /// a batch record.
    pub fn replay_for_request(
        &self,
        request: &InformationRequest,
        requested_at: DateTime<Utc>,
    ) -> Result<ReplayReply, ReplayServiceError> {
        let candidates = self
            .store
            .unconsumed_documents(&request.subject_id, &request.employer_id)?;
        if candidates.is_empty() {
            info!(case_id = %request.case_id, "no unconsumed documents for request");
        }

        let candidate_count = candidates.len();
        let mut relevant: Vec<(i64, Uuid, Value)> = Vec::new();
        for stored in candidates {
            let payload: Value = match serde_json::from_str(&stored.payload) {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        internal_id = %stored.internal_id,
                        "discarding document with undecodable payload: {err}"
                    );
                    continue;
                }
            };
            let document: IncomeDocument = match serde_json::from_value(payload.clone()) {
                Ok(document) => document,
                Err(err) => {
                    warn!(
                        internal_id = %stored.internal_id,
                        "discarding document that does not match the contract: {err}"
                    );
                    continue;
                }
            };
            if request.is_document_relevant(&document) {
                relevant.push((stored.id, stored.internal_id, payload));
            }
        }
        if relevant.is_empty() && candidate_count > 0 {
            info!(
                case_id = %request.case_id,
                "no relevant documents among {candidate_count} unconsumed"
            );
        }

        let selected: Vec<(i64, Uuid, Value)> = relevant
            .into_iter()
            .take(MAX_DOCUMENTS_PER_REPLAY)
            .collect();

        let batch_id = self.store.create_replay_batch(NewReplayBatch {
            subject_id: request.subject_id.clone(),
            employer_id: request.employer_id.clone(),
            case_id: request.case_id,
            requested_at,
            document_ids: selected.iter().map(|(id, _, _)| *id).collect(),
        })?;

        let reply = ReplayReply {
            subject_id: request.subject_id.clone(),
            employer_id: request.employer_id.clone(),
            case_id: request.case_id,
            batch_id,
            documents: selected
                .into_iter()
                .map(|(_, internal_id, document)| ReplayedDocument {
                    internal_id,
                    document,
                })
                .collect(),
        };
        info!(
            batch_id,
            documents = reply.documents.len(),
            "issuing replay batch"
        );
        self.publisher.publish(&reply)?;
        Ok(reply)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

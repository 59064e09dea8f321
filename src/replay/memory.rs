use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::document::PORTAL_SENDER_SYSTEMS;
use super::repository::{DocumentStore, NewDocument, NewReplayBatch, StoreError, StoredDocument};

/// In-memory document store backing the default runtime and the test suites.
/// Keeps the same row shapes and retrieval rules as the external database
/// collaborator it stands in for.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    documents: Vec<DocumentRow>,
    consumptions: Vec<ConsumptionRecord>,
    batches: Vec<ReplayBatchRecord>,
}

struct DocumentRow {
    id: i64,
    document: NewDocument,
}

/// Consumption-log row, exposed for inspection.
#[derive(Debug, Clone)]
pub struct ConsumptionRecord {
    pub document_id: i64,
    pub subject_id: String,
    pub case_id: Uuid,
    pub consumed_at: DateTime<Utc>,
}

/// Issued replay batch, exposed for inspection.
#[derive(Debug, Clone)]
pub struct ReplayBatchRecord {
    pub id: i64,
    pub subject_id: String,
    pub employer_id: String,
    pub case_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub document_ids: Vec<i64>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn batches(&self) -> Vec<ReplayBatchRecord> {
        self.lock().batches.clone()
    }

    pub fn consumptions(&self) -> Vec<ConsumptionRecord> {
        self.lock().consumptions.clone()
    }

    pub fn is_consumed_by(&self, internal_id: Uuid, case_id: Uuid) -> bool {
        let state = self.lock();
        let document_id = state
            .documents
            .iter()
            .find(|row| row.document.internal_id == internal_id)
            .map(|row| row.id);
        match document_id {
            Some(id) => state
                .consumptions
                .iter()
                .any(|row| row.document_id == id && row.case_id == case_id),
            None => false,
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert_document(&self, document: NewDocument) -> Result<(), StoreError> {
        let mut state = self.lock();
        let already_known = state
            .documents
            .iter()
            .any(|row| row.document.internal_id == document.internal_id);
        if already_known {
            return Ok(());
        }
        let id = state.documents.len() as i64 + 1;
        state.documents.push(DocumentRow { id, document });
        Ok(())
    }

    fn record_consumption(
        &self,
        internal_id: Uuid,
        subject_id: &str,
        case_id: Uuid,
        consumed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        let document_id = match state
            .documents
            .iter()
            .find(|row| row.document.internal_id == internal_id)
        {
            Some(row) => row.id,
            // Consumption of a document this service never saw; nothing to
            // link the row to.
            None => return Ok(()),
        };
        state.consumptions.push(ConsumptionRecord {
            document_id,
            subject_id: subject_id.to_string(),
            case_id,
            consumed_at,
        });
        Ok(())
    }

    fn unconsumed_documents(
        &self,
        subject_id: &str,
        employer_id: &str,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let state = self.lock();
        let documents = state
            .documents
            .iter()
            .filter(|row| row.document.subject_id == subject_id)
            .filter(|row| row.document.employer_id.as_deref() == Some(employer_id))
            .filter(|row| {
                row.document
                    .sender_system
                    .as_deref()
                    .map(|name| !PORTAL_SENDER_SYSTEMS.contains(&name))
                    .unwrap_or(true)
            })
            .filter(|row| {
                !state
                    .consumptions
                    .iter()
                    .any(|consumption| consumption.document_id == row.id)
            })
            .map(|row| StoredDocument {
                id: row.id,
                internal_id: row.document.internal_id,
                first_absence_day: row.document.first_absence_day,
                payload: row.document.payload.clone(),
            })
            .collect();
        Ok(documents)
    }

    fn create_replay_batch(&self, batch: NewReplayBatch) -> Result<i64, StoreError> {
        let mut state = self.lock();
        let id = state.batches.len() as i64 + 1;
        state.batches.push(ReplayBatchRecord {
            id,
            subject_id: batch.subject_id,
            employer_id: batch.employer_id,
            case_id: batch.case_id,
            requested_at: batch.requested_at,
            document_ids: batch.document_ids,
        });
        Ok(id)
    }
}

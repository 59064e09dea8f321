use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields captured when a document-registered event is accepted.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub subject_id: String,
    /// Documents without an employer identifier are stored but never match a
    /// retrieval.
    pub employer_id: Option<String>,
    pub external_id: Uuid,
    pub internal_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub sender_system: Option<String>,
    pub first_absence_day: Option<NaiveDate>,
    pub income_reference_date: Option<NaiveDate>,
    /// Full document payload, stored verbatim.
    pub payload: String,
}

/// A stored, not-yet-consumed document as returned by the retrieval query.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Storage identifier; replay-batch membership rows reference it.
    pub id: i64,
    pub internal_id: Uuid,
    pub first_absence_day: Option<NaiveDate>,
    pub payload: String,
}

/// A replay batch to be persisted, linking the request identifiers to the
/// chosen documents' storage ids.
#[derive(Debug, Clone)]
pub struct NewReplayBatch {
    pub subject_id: String,
    pub employer_id: String,
    pub case_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub document_ids: Vec<i64>,
}

/// Storage contract the replay pipeline depends on. The production database
/// adapter lives outside this crate; `InMemoryDocumentStore` is the default
/// runtime implementation.
pub trait DocumentStore: Send + Sync {
    /// Stores a received document. Inserting an already known internal id is
    /// a no-op.
    fn insert_document(&self, document: NewDocument) -> Result<(), StoreError>;

    /// Records that a case consumed a document. Unknown internal ids are
    /// ignored.
    fn record_consumption(
        &self,
        internal_id: Uuid,
        subject_id: &str,
        case_id: Uuid,
        consumed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// All documents for the subject/employer pair that were not submitted
    /// through the self-service portal and have no consumption record, in
    /// insertion order.
    fn unconsumed_documents(
        &self,
        subject_id: &str,
        employer_id: &str,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Persists a replay batch and its membership rows, returning the new
    /// batch identifier. A batch with no documents is still persisted.
    fn create_replay_batch(&self, batch: NewReplayBatch) -> Result<i64, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("replay batch was not assigned an identifier")]
    MissingBatchId,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Reply event enumerating the documents chosen for replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReply {
    pub subject_id: String,
    pub employer_id: String,
    pub case_id: Uuid,
    pub batch_id: i64,
    pub documents: Vec<ReplayedDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayedDocument {
    pub internal_id: Uuid,
    /// The stored payload decoded back to JSON, all fields intact.
    pub document: serde_json::Value,
}

/// Outbound seam for the reply event.
pub trait ReplayPublisher: Send + Sync {
    fn publish(&self, reply: &ReplayReply) -> Result<(), PublishError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("reply transport unavailable: {0}")]
    Transport(String),
}

/// Default publisher: emits the serialized reply through the log pipeline.
/// The bus producer that forwards replies onto the event stream is an
/// external collaborator.
#[derive(Debug, Default, Clone)]
pub struct LogPublisher;

impl ReplayPublisher for LogPublisher {
    fn publish(&self, reply: &ReplayReply) -> Result<(), PublishError> {
        let json = serde_json::to_string(reply)
            .map_err(|err| PublishError::Transport(err.to_string()))?;
        tracing::info!(batch_id = reply.batch_id, "publishing replay reply: {json}");
        Ok(())
    }
}

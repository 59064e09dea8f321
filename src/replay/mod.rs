//! Intake, consumption tracking, and replay of income-reporting documents.
//!
//! Documents arrive as events and are stored untouched; when a downstream
//! case asks for employer-supplied information, every stored document that
//! has not yet been consumed is run through the relevance predicate and the
//! matching ones are replayed as a capped batch.

pub mod document;
pub mod domain;
pub mod memory;
mod relevance;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use document::IncomeDocument;
pub use domain::{FirstAbsenceDay, InformationRequest, Period};
pub use memory::InMemoryDocumentStore;
pub use repository::{
    DocumentStore, LogPublisher, NewDocument, NewReplayBatch, PublishError, ReplayPublisher,
    ReplayReply, ReplayedDocument, StoreError, StoredDocument,
};
pub use router::replay_router;
pub use service::{ReplayService, ReplayServiceError, MAX_DOCUMENTS_PER_REPLAY};

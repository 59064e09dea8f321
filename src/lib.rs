//! Income-reporting document replay service.
//!
//! Consumes events about received income-reporting documents and about
//! requests for employer-supplied information, persists the documents,
//! tracks which ones downstream case processing already consumed, and
//! replays the unconsumed documents relevant to a new request.

pub mod config;
pub mod error;
pub mod replay;
pub mod telemetry;

//! Document store trait abstraction.
//!
//! Provides a trait-based abstraction over the remote document store with
//! filtered, ordered, live queries.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::listener::ListenerRegistration;
use crate::error::{ListenError, WriteError};
use crate::models::{Document, DocumentRef, Fields, Query};

/// One notification from a live query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// The complete current result set. Supersedes every earlier snapshot.
    Snapshot(Vec<Document>),
    /// The listener failed. No further events follow.
    Error(ListenError),
}

/// A live query connection.
///
/// Dropping `registration` detaches the listener at the store.
#[derive(Debug)]
pub struct LiveQuery {
    pub events: mpsc::UnboundedReceiver<QueryEvent>,
    pub registration: ListenerRegistration,
}

/// Trait for document store operations.
///
/// Writes never report back through the return value what the document looks
/// like afterwards; live queries are the only read path.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document in `collection` and return its store-assigned id.
    async fn create_document(&self, collection: &str, fields: Fields) -> Result<String, WriteError>;

    /// Merge `fields` into an existing document.
    async fn update_document(&self, doc: &DocumentRef, fields: Fields) -> Result<(), WriteError>;

    /// Delete a document.
    async fn delete_document(&self, doc: &DocumentRef) -> Result<(), WriteError>;

    /// Open a live query. The first event is the initial result set.
    fn live_query(&self, query: Query) -> LiveQuery;
}

//! In-memory document store for testing.
//!
//! Evaluates live queries against its own collections and re-delivers the
//! full result set to every matching listener after each write.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

use super::lock;
use crate::error::{ListenError, WriteError};
use crate::models::{Document, DocumentRef, Fields, Query};
use crate::traits::{DocumentStore, ListenerRegistration, LiveQuery, QueryEvent};

struct QueryListener {
    query: Query,
    tx: mpsc::UnboundedSender<QueryEvent>,
}

/// In-memory document store.
///
/// Documents keep insertion order, so ties under a query's ordering come
/// back in the order they were written.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    /// Documents per collection
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
    /// Attached live queries by registration id
    listeners: Arc<Mutex<HashMap<u64, QueryListener>>>,
    next_listener: Arc<AtomicU64>,
    /// Whether every operation should fail as if offline
    unreachable: Arc<AtomicBool>,
    /// When set, writes wait for a notification before applying
    write_gate: Arc<Mutex<Option<Arc<Notify>>>>,
    write_calls: Arc<AtomicUsize>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(Mutex::new(HashMap::new())),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: Arc::new(AtomicU64::new(0)),
            unreachable: Arc::new(AtomicBool::new(false)),
            write_gate: Arc::new(Mutex::new(None)),
            write_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every subsequent write and new live query fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Hold subsequent writes until the returned gate is notified.
    pub fn pause_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.write_gate) = Some(gate.clone());
        gate
    }

    pub fn resume_writes(&self) {
        if let Some(gate) = lock(&self.write_gate).take() {
            gate.notify_waiters();
        }
    }

    /// Seed a document directly and notify listeners.
    pub fn insert_document(&self, collection: &str, id: &str, fields: Fields) {
        {
            let mut collections = lock(&self.collections);
            let docs = collections.entry(collection.to_string()).or_default();
            match docs.iter_mut().find(|doc| doc.id == id) {
                Some(doc) => doc.fields = fields,
                None => docs.push(Document::new(id, fields)),
            }
        }
        self.notify(collection);
    }

    /// Deliver `docs` verbatim to every attached listener, bypassing query
    /// evaluation.
    pub fn emit_snapshot(&self, docs: Vec<Document>) {
        let mut listeners = lock(&self.listeners);
        listeners.retain(|_, listener| listener.tx.send(QueryEvent::Snapshot(docs.clone())).is_ok());
    }

    /// Fail every attached listener with `error`. Failed listeners are
    /// detached, matching a store that stops delivering after an error.
    pub fn fail_listeners(&self, error: ListenError) {
        let mut listeners = lock(&self.listeners);
        for (_, listener) in listeners.drain() {
            let _ = listener.tx.send(QueryEvent::Error(error.clone()));
        }
    }

    /// Number of live queries still attached.
    pub fn active_listeners(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Number of create/update/delete calls received, including failed ones.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn document(&self, collection: &str, id: &str) -> Option<Document> {
        lock(&self.collections)
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned())
    }

    fn evaluate(&self, query: &Query) -> Vec<Document> {
        let mut docs: Vec<Document> = lock(&self.collections)
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        query.sort(&mut docs);
        docs
    }

    fn notify(&self, collection: &str) {
        let mut listeners = lock(&self.listeners);
        listeners.retain(|_, listener| {
            if listener.query.collection != collection {
                return true;
            }
            let docs = self.evaluate(&listener.query);
            listener.tx.send(QueryEvent::Snapshot(docs)).is_ok()
        });
    }

    async fn begin_write(&self) -> Result<(), WriteError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        let gate = lock(&self.write_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(WriteError::Unavailable {
                message: "in-memory store is offline".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_document(&self, collection: &str, fields: Fields) -> Result<String, WriteError> {
        self.begin_write().await?;

        let id = Uuid::new_v4().simple().to_string();
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.as_str(), fields));

        self.notify(collection);
        Ok(id)
    }

    async fn update_document(&self, doc: &DocumentRef, fields: Fields) -> Result<(), WriteError> {
        self.begin_write().await?;

        {
            let mut collections = lock(&self.collections);
            let existing = collections
                .get_mut(&doc.collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == doc.id))
                .ok_or_else(|| WriteError::NotFound {
                    id: doc.id.clone(),
                })?;
            existing.fields.extend(fields);
        }

        self.notify(&doc.collection);
        Ok(())
    }

    async fn delete_document(&self, doc: &DocumentRef) -> Result<(), WriteError> {
        self.begin_write().await?;

        let removed = {
            let mut collections = lock(&self.collections);
            match collections.get_mut(&doc.collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|d| d.id != doc.id);
                    docs.len() != before
                }
                None => false,
            }
        };

        if removed {
            self.notify(&doc.collection);
        }
        Ok(())
    }

    fn live_query(&self, query: Query) -> LiveQuery {
        let (tx, events) = mpsc::unbounded_channel();

        if self.unreachable.load(Ordering::SeqCst) {
            let _ = tx.send(QueryEvent::Error(ListenError::Unavailable {
                message: "in-memory store is offline".to_string(),
            }));
            return LiveQuery {
                events,
                registration: ListenerRegistration::noop(),
            };
        }

        let _ = tx.send(QueryEvent::Snapshot(self.evaluate(&query)));

        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).insert(id, QueryListener { query, tx });

        let listeners = Arc::clone(&self.listeners);
        let registration = ListenerRegistration::new(move || {
            lock(&listeners).remove(&id);
        });

        LiveQuery {
            events,
            registration,
        }
    }
}

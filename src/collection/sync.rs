//! Live, per-user collection view with store-mediated writes.
//!
//! Writes go to the store and return; they never touch the local view. The
//! view changes only when the live query delivers a snapshot, and each
//! snapshot replaces the whole item list.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::schema::ItemSchema;
use crate::config::{OwnershipCheck, SyncConfig};
use crate::error::WriteError;
use crate::models::{CollectionView, Document, Fields, Item, ItemId, UserId};
use crate::subscription::{LoadingGuard, SubscriptionHandle};
use crate::traits::{DocumentStore, LiveQuery, QueryEvent, UserIdSource};

pub struct CollectionSync {
    store: Arc<dyn DocumentStore>,
    user: Box<dyn UserIdSource>,
    schema: ItemSchema,
    ownership: OwnershipCheck,
    state: Arc<watch::Sender<CollectionView>>,
    subscription: Option<SubscriptionHandle>,
}

impl CollectionSync {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        user: impl UserIdSource + 'static,
        config: &SyncConfig,
    ) -> Self {
        let (state, _) = watch::channel(CollectionView::default());
        Self {
            store,
            user: Box::new(user),
            schema: config.schema(),
            ownership: config.ownership_check,
            state: Arc::new(state),
            subscription: None,
        }
    }

    pub fn schema(&self) -> &ItemSchema {
        &self.schema
    }

    /// Current view snapshot.
    pub fn view(&self) -> CollectionView {
        self.state.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn subscribe(&self) -> watch::Receiver<CollectionView> {
        self.state.subscribe()
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.borrow().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// True while a live query is attached and has not failed.
    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(SubscriptionHandle::is_active)
    }

    /// User the active subscription was opened for.
    pub fn subscribed_user(&self) -> Option<UserId> {
        self.subscription.as_ref()?;
        self.state.borrow().owner().cloned()
    }

    /// Open the live query for the current user's items.
    ///
    /// Does nothing when nobody is signed in. Any previous subscription is
    /// released before the new one is attached, and snapshots still in flight
    /// from it are discarded. Must be called from within a tokio runtime.
    pub fn subscribe_to_items(&mut self) {
        let Some(user_id) = self.user.current_user_id() else {
            debug!("No user signed in, not subscribing to items");
            return;
        };

        self.release_subscription();

        let mut epoch = 0;
        self.state.send_modify(|view| {
            view.epoch += 1;
            epoch = view.epoch;
            if view.owner.as_ref() != Some(&user_id) {
                view.items.clear();
                view.owner = Some(user_id.clone());
            }
            view.loading = true;
        });

        let LiveQuery {
            events,
            registration,
        } = self.store.live_query(self.schema.owner_query(&user_id));

        let task = tokio::spawn(pump_snapshots(
            events,
            Arc::clone(&self.state),
            epoch,
            user_id.clone(),
            self.schema.clone(),
        ));
        self.subscription = Some(SubscriptionHandle::new("items", registration, task));
        info!(user_id = %user_id, collection = %self.schema.collection, epoch, "Subscribed to items");
    }

    /// Create an item owned by the current user.
    ///
    /// Returns `Ok(None)` without calling the store when nobody is signed in.
    /// The new item shows up in the view once the live query delivers it.
    pub async fn add_item(&self, payload: Fields) -> Result<Option<ItemId>, WriteError> {
        let Some(user_id) = self.user.current_user_id() else {
            debug!("No user signed in, not adding item");
            return Ok(None);
        };

        let _loading = LoadingGuard::raise(&*self.state);
        let fields = self.schema.creation_fields(payload, &user_id, Utc::now());

        match self
            .store
            .create_document(&self.schema.collection, fields)
            .await
        {
            Ok(id) => {
                info!(user_id = %user_id, item_id = %id, "Item added");
                Ok(Some(ItemId::from(id)))
            }
            Err(err) => {
                error!(code = err.error_code(), user_id = %user_id, "Error adding item: {}", err);
                Err(err)
            }
        }
    }

    /// Merge `payload` into an item and bump its update timestamp.
    ///
    /// Owner and creation timestamp keys in `payload` are ignored.
    pub async fn update_item(&self, id: &ItemId, payload: Fields) -> Result<(), WriteError> {
        let Some(user_id) = self.user.current_user_id() else {
            debug!(item_id = %id, "No user signed in, not updating item");
            return Ok(());
        };
        self.check_ownership(&user_id, id)?;

        if self.schema.touches_immutable_fields(&payload) {
            warn!(item_id = %id, "Ignoring owner/creation fields in update payload");
        }

        let _loading = LoadingGuard::raise(&*self.state);
        let fields = self.schema.update_fields(payload, Utc::now());

        match self
            .store
            .update_document(&self.schema.doc_ref(id), fields)
            .await
        {
            Ok(()) => {
                info!(user_id = %user_id, item_id = %id, "Item updated");
                Ok(())
            }
            Err(err) => {
                error!(code = err.error_code(), item_id = %id, "Error updating item: {}", err);
                Err(err)
            }
        }
    }

    pub async fn delete_item(&self, id: &ItemId) -> Result<(), WriteError> {
        let Some(user_id) = self.user.current_user_id() else {
            debug!(item_id = %id, "No user signed in, not deleting item");
            return Ok(());
        };
        self.check_ownership(&user_id, id)?;

        let _loading = LoadingGuard::raise(&*self.state);

        match self.store.delete_document(&self.schema.doc_ref(id)).await {
            Ok(()) => {
                info!(user_id = %user_id, item_id = %id, "Item deleted");
                Ok(())
            }
            Err(err) => {
                error!(code = err.error_code(), item_id = %id, "Error deleting item: {}", err);
                Err(err)
            }
        }
    }

    /// Release the live query if one is attached. Idempotent.
    pub fn cleanup(&mut self) {
        self.release_subscription();
    }

    fn release_subscription(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.state.send_if_modified(|view| {
                view.epoch += 1;
                false
            });
            handle.release();
            debug!("Items subscription released");
        }
    }

    fn check_ownership(&self, user_id: &UserId, id: &ItemId) -> Result<(), WriteError> {
        if self.ownership == OwnershipCheck::Store {
            return Ok(());
        }

        let view = self.state.borrow();
        if view.owner() == Some(user_id) && view.contains(id) {
            return Ok(());
        }

        let err = WriteError::NotOwner { id: id.to_string() };
        error!(code = err.error_code(), user_id = %user_id, "Refusing write: {}", err);
        Err(err)
    }
}

/// Turn one store snapshot into the ordered item list for `owner`.
///
/// Undecodable documents and documents owned by someone else are dropped.
pub(crate) fn decode_snapshot(docs: &[Document], owner: &UserId, schema: &ItemSchema) -> Vec<Item> {
    let mut items: Vec<Item> = docs
        .iter()
        .filter_map(|doc| match schema.decode(doc) {
            Ok(item) if &item.owner_id == owner => Some(item),
            Ok(item) => {
                warn!(item_id = %item.id, owner = %item.owner_id, "Dropping item owned by another user");
                None
            }
            Err(err) => {
                warn!("Dropping undecodable document: {}", err);
                None
            }
        })
        .collect();

    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

/// Replace the view's items if `epoch` is still current.
pub(crate) fn apply_snapshot(
    state: &watch::Sender<CollectionView>,
    epoch: u64,
    items: Vec<Item>,
) -> bool {
    state.send_if_modified(|view| {
        if view.epoch != epoch {
            return false;
        }
        view.items = items;
        view.loading = false;
        true
    })
}

async fn pump_snapshots(
    mut events: mpsc::UnboundedReceiver<QueryEvent>,
    state: Arc<watch::Sender<CollectionView>>,
    epoch: u64,
    owner: UserId,
    schema: ItemSchema,
) {
    while let Some(event) = events.recv().await {
        match event {
            QueryEvent::Snapshot(docs) => {
                let items = decode_snapshot(&docs, &owner, &schema);
                let count = items.len();
                if !apply_snapshot(&state, epoch, items) {
                    debug!(epoch, "Dropping snapshot from released subscription");
                    break;
                }
                debug!(user_id = %owner, count, "Items snapshot applied");
            }
            QueryEvent::Error(err) => {
                error!(code = err.error_code(), user_id = %owner, "Error listening to items: {}", err);
                state.send_if_modified(|view| {
                    if view.epoch != epoch {
                        return false;
                    }
                    view.loading = false;
                    true
                });
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(id: &str, owner: &str, created: &str) -> Document {
        let fields = match json!({
            "userId": owner,
            "createdAt": created,
            "updatedAt": created,
            "title": id,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        Document::new(id, fields)
    }

    #[test]
    fn test_decode_snapshot_filters_and_sorts() {
        let schema = ItemSchema::default();
        let owner = UserId::from("alice");
        let docs = vec![
            doc("old", "alice", "2024-01-01T00:00:00Z"),
            doc("foreign", "bob", "2024-06-01T00:00:00Z"),
            doc("new", "alice", "2024-03-01T00:00:00Z"),
            Document::new("broken", Fields::new()),
        ];

        let items = decode_snapshot(&docs, &owner, &schema);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert!(items.iter().all(|i| i.owner_id == owner));
    }

    #[test]
    fn test_decode_snapshot_keeps_store_order_for_ties() {
        let schema = ItemSchema::default();
        let owner = UserId::from("alice");
        let docs = vec![
            doc("first", "alice", "2024-01-01T00:00:00Z"),
            doc("second", "alice", "2024-01-01T00:00:00Z"),
        ];
        let items = decode_snapshot(&docs, &owner, &schema);
        assert_eq!(items[0].id.as_str(), "first");
        assert_eq!(items[1].id.as_str(), "second");
    }

    #[test]
    fn test_apply_snapshot_respects_epoch() {
        let (tx, rx) = watch::channel(CollectionView::default());
        tx.send_modify(|view| {
            view.epoch = 3;
            view.loading = true;
        });

        let schema = ItemSchema::default();
        let owner = UserId::from("alice");
        let items = decode_snapshot(&[doc("a", "alice", "2024-01-01T00:00:00Z")], &owner, &schema);

        assert!(!apply_snapshot(&tx, 2, items.clone()));
        assert!(rx.borrow().is_empty());
        assert!(rx.borrow().loading);

        assert!(apply_snapshot(&tx, 3, items));
        assert_eq!(rx.borrow().ids(), vec!["a"]);
        assert!(!rx.borrow().loading);
    }

    #[tokio::test]
    async fn test_pump_error_clears_loading_and_keeps_items() {
        let (tx, rx) = watch::channel(CollectionView::default());
        let tx = Arc::new(tx);
        tx.send_modify(|view| {
            view.epoch = 1;
            view.loading = true;
        });

        let (events_tx, events) = mpsc::unbounded_channel();
        events_tx
            .send(QueryEvent::Snapshot(vec![doc("a", "alice", "2024-01-01T00:00:00Z")]))
            .unwrap();
        events_tx
            .send(QueryEvent::Error(crate::error::ListenError::Cancelled))
            .unwrap();
        events_tx
            .send(QueryEvent::Snapshot(Vec::new()))
            .unwrap();

        pump_snapshots(events, tx.clone(), 1, UserId::from("alice"), ItemSchema::default()).await;

        let view = rx.borrow().clone();
        assert_eq!(view.ids(), vec!["a"]);
        assert!(!view.loading);
    }
}

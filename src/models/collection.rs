use super::item::{Item, ItemId};
use super::user::UserId;

/// The live, ordered view of one user's items.
///
/// Items are replaced wholesale on every snapshot and are ordered by
/// creation time, newest first. Every item belongs to [`CollectionView::owner`].
#[derive(Debug, Clone, Default)]
pub struct CollectionView {
    pub items: Vec<Item>,
    pub loading: bool,
    /// User the current items were fetched for.
    pub(crate) owner: Option<UserId>,
    /// Bumped on every subscribe and cleanup; snapshots from older epochs are dropped.
    pub(crate) epoch: u64,
}

impl PartialEq for CollectionView {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items && self.loading == other.loading && self.owner == other.owner
    }
}

impl CollectionView {
    pub fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }
}

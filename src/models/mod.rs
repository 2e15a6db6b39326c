//! Data model shared by the session and collection layers.

mod collection;
mod document;
mod item;
mod query;
mod session;
mod user;

pub use collection::CollectionView;
pub use document::{Document, DocumentRef, Fields};
pub use item::{Item, ItemId};
pub use query::{compare_values, Direction, Filter, OrderBy, Query};
pub use session::{Session, SessionPhase};
pub use user::{AccessToken, Credential, UserId, UserIdentity};

//! Per-user live collection synchronization.

mod schema;
mod sync;

pub use schema::{decode_timestamp, encode_timestamp, DecodeError, ItemSchema};
pub use sync::CollectionSync;

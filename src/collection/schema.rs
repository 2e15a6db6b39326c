//! Mapping between items and store documents.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Direction, Document, DocumentRef, Fields, Item, ItemId, Query, UserId};

/// A stored document that cannot be read back as an [`Item`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("document '{id}' has no '{field}' field")]
    MissingField { id: String, field: String },

    #[error("document '{id}' field '{field}' is not a timestamp: {value}")]
    InvalidTimestamp {
        id: String,
        field: String,
        value: String,
    },

    #[error("document '{id}' field '{field}' is not a string")]
    InvalidOwner { id: String, field: String },
}

/// Collection name plus the names of the fields this layer manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSchema {
    pub collection: String,
    pub owner_field: String,
    pub created_field: String,
    pub updated_field: String,
}

impl Default for ItemSchema {
    fn default() -> Self {
        crate::config::SyncConfig::default().schema()
    }
}

impl ItemSchema {
    /// `owner == user`, newest first.
    pub fn owner_query(&self, user: &UserId) -> Query {
        Query::collection(self.collection.as_str())
            .where_eq(self.owner_field.as_str(), user.as_str())
            .order_by(self.created_field.as_str(), Direction::Descending)
    }

    pub fn doc_ref(&self, id: &ItemId) -> DocumentRef {
        DocumentRef::new(self.collection.as_str(), id.as_str())
    }

    /// Payload for a new document. Managed fields override payload keys of the
    /// same name.
    pub fn creation_fields(&self, payload: Fields, owner: &UserId, now: DateTime<Utc>) -> Fields {
        let mut fields = payload;
        fields.insert(self.owner_field.clone(), Value::String(owner.to_string()));
        fields.insert(self.created_field.clone(), encode_timestamp(now));
        fields.insert(self.updated_field.clone(), encode_timestamp(now));
        fields
    }

    /// Payload for an update: owner and creation time are never rewritten, the
    /// update timestamp always is.
    pub fn update_fields(&self, payload: Fields, now: DateTime<Utc>) -> Fields {
        let mut fields = payload;
        fields.remove(&self.owner_field);
        fields.remove(&self.created_field);
        fields.insert(self.updated_field.clone(), encode_timestamp(now));
        fields
    }

    /// True if `payload` tries to set a field only this layer may set at creation.
    pub fn touches_immutable_fields(&self, payload: &Fields) -> bool {
        payload.contains_key(&self.owner_field) || payload.contains_key(&self.created_field)
    }

    pub fn decode(&self, doc: &Document) -> Result<Item, DecodeError> {
        let owner = match doc.get(&self.owner_field) {
            Some(Value::String(owner)) => UserId::from(owner.as_str()),
            Some(_) => {
                return Err(DecodeError::InvalidOwner {
                    id: doc.id.clone(),
                    field: self.owner_field.clone(),
                })
            }
            None => return Err(self.missing(doc, &self.owner_field)),
        };
        let created_at = self.timestamp(doc, &self.created_field)?;
        let updated_at = self.timestamp(doc, &self.updated_field)?;

        let mut fields = doc.fields.clone();
        fields.remove(&self.owner_field);
        fields.remove(&self.created_field);
        fields.remove(&self.updated_field);

        Ok(Item {
            id: ItemId::new(doc.id.as_str()),
            owner_id: owner,
            created_at,
            updated_at,
            fields,
        })
    }

    fn timestamp(&self, doc: &Document, field: &str) -> Result<DateTime<Utc>, DecodeError> {
        let value = doc.get(field).ok_or_else(|| self.missing(doc, field))?;
        decode_timestamp(value).ok_or_else(|| DecodeError::InvalidTimestamp {
            id: doc.id.clone(),
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    fn missing(&self, doc: &Document, field: &str) -> DecodeError {
        DecodeError::MissingField {
            id: doc.id.clone(),
            field: field.to_string(),
        }
    }
}

/// Timestamps are stored as RFC 3339 strings in UTC with millisecond precision.
pub fn encode_timestamp(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Accepts RFC 3339 strings and integer epoch milliseconds.
pub fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_owner_query_shape() {
        let schema = ItemSchema::default();
        let query = schema.owner_query(&UserId::from("alice"));
        assert_eq!(query.collection, "items");
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].field, "userId");
        assert_eq!(query.filters[0].value, json!("alice"));
        assert_eq!(query.order_by.len(), 1);
        assert_eq!(query.order_by[0].field, "createdAt");
        assert_eq!(query.order_by[0].direction, Direction::Descending);
    }

    #[test]
    fn test_creation_fields_managed_fields_win() {
        let schema = ItemSchema::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let payload = fields(json!({"title": "x", "userId": "mallory"}));

        let out = schema.creation_fields(payload, &UserId::from("alice"), now);
        assert_eq!(out["title"], json!("x"));
        assert_eq!(out["userId"], json!("alice"));
        assert_eq!(out["createdAt"], json!("2024-05-01T12:00:00.000Z"));
        assert_eq!(out["createdAt"], out["updatedAt"]);
    }

    #[test]
    fn test_update_fields_strip_immutable() {
        let schema = ItemSchema::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let payload = fields(json!({"title": "y", "userId": "mallory", "createdAt": "1970-01-01T00:00:00Z"}));
        assert!(schema.touches_immutable_fields(&payload));

        let out = schema.update_fields(payload, now);
        assert_eq!(out.len(), 2);
        assert_eq!(out["title"], json!("y"));
        assert_eq!(out["updatedAt"], json!("2024-05-02T00:00:00.000Z"));
    }

    #[test]
    fn test_decode_lifts_managed_fields() {
        let schema = ItemSchema::default();
        let doc = Document::new(
            "a",
            fields(json!({
                "title": "hello",
                "userId": "alice",
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": 1704067200000i64,
            })),
        );

        let item = schema.decode(&doc).unwrap();
        assert_eq!(item.id, ItemId::from("a"));
        assert_eq!(item.owner_id, UserId::from("alice"));
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(item.fields, fields(json!({"title": "hello"})));
        assert_eq!(item.get_str("title"), Some("hello"));
    }

    #[test]
    fn test_decode_errors() {
        let schema = ItemSchema::default();

        let no_owner = Document::new("a", fields(json!({"createdAt": "2024-01-01T00:00:00Z"})));
        assert!(matches!(
            schema.decode(&no_owner),
            Err(DecodeError::MissingField { field, .. }) if field == "userId"
        ));

        let bad_ts = Document::new(
            "b",
            fields(json!({"userId": "alice", "createdAt": "yesterday", "updatedAt": "2024-01-01T00:00:00Z"})),
        );
        assert!(matches!(
            schema.decode(&bad_ts),
            Err(DecodeError::InvalidTimestamp { field, .. }) if field == "createdAt"
        ));

        let numeric_owner = Document::new("c", fields(json!({"userId": 7})));
        assert!(matches!(
            schema.decode(&numeric_owner),
            Err(DecodeError::InvalidOwner { .. })
        ));
    }
}

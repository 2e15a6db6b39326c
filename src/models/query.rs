//! Live query description passed to the document store.
//!
//! Stores translate this into their own query language. The evaluation
//! helpers here give in-process stores the same semantics: equality filters
//! on top-level fields and a multi-key ordering.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::document::{Document, Fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Add an equality filter (`field == value`).
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// True if every filter matches. Missing fields never match.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|filter| fields.get(&filter.field) == Some(&filter.value))
    }

    /// Stable sort of `docs` by the query's ordering keys.
    pub fn sort(&self, docs: &mut [Document]) {
        docs.sort_by(|a, b| self.compare(&a.fields, &b.fields));
    }

    fn compare(&self, a: &Fields, b: &Fields) -> Ordering {
        for key in &self.order_by {
            let ordering = compare_values(a.get(&key.field), b.get(&key.field));
            let ordering = match key.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Total order over JSON values: missing < null < bool < number < timestamp < string,
/// with RFC 3339 strings compared as instants.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let rank = type_rank(a).cmp(&type_rank(b));
            if rank != Ordering::Equal {
                return rank;
            }
            match (a, b) {
                (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                (Value::Number(x), Value::Number(y)) => {
                    let x = x.as_f64().unwrap_or(f64::NAN);
                    let y = y.as_f64().unwrap_or(f64::NAN);
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
                (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                },
                _ => Ordering::Equal,
            }
        }
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(s) if parse_instant(s).is_some() => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_matches_equality_filters() {
        let query = Query::collection("items").where_eq("userId", "alice");
        assert!(query.matches(&doc("a", json!({"userId": "alice"})).fields));
        assert!(!query.matches(&doc("b", json!({"userId": "bob"})).fields));
        assert!(!query.matches(&doc("c", json!({"title": "x"})).fields));
    }

    #[test]
    fn test_sort_descending_timestamps() {
        let query = Query::collection("items").order_by("createdAt", Direction::Descending);
        let mut docs = vec![
            doc("old", json!({"createdAt": "2024-01-01T00:00:00Z"})),
            doc("new", json!({"createdAt": "2024-03-01T00:00:00+02:00"})),
            doc("mid", json!({"createdAt": "2024-02-01T00:00:00.500Z"})),
        ];
        query.sort(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_missing_sort_key_orders_first_ascending() {
        let query = Query::collection("items").order_by("rank", Direction::Ascending);
        let mut docs = vec![
            doc("ranked", json!({"rank": 1})),
            doc("unranked", json!({})),
        ];
        query.sort(&mut docs);
        assert_eq!(docs[0].id, "unranked");
    }

    #[test]
    fn test_compare_mixed_types() {
        assert_eq!(
            compare_values(Some(&json!(5)), Some(&json!("text"))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!(2.5)), Some(&json!(2))),
            Ordering::Greater
        );
        assert_eq!(compare_values(None, None), Ordering::Equal);
    }
}

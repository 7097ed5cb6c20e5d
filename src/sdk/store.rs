//! Document store abstraction
//!
//! Collections of JSON documents keyed by id, with equality and range
//! filters on top-level fields. Both back ends share [`Query::apply`] semantics
//! so results are ordered and limited the same way.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

use super::SdkError;

/// Top-level fields of a document
pub type Fields = Map<String, Value>;

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Deserialize the fields, with the document id injected as `id`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SdkError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Serialize a value into document fields, dropping any `id` field
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, SdkError> {
    match serde_json::to_value(value)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(SdkError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Comparison operator of a field filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    /// Firestore structured query operator name
    pub fn as_firestore(&self) -> &'static str {
        match self {
            FilterOp::Eq => "EQUAL",
            FilterOp::Lt => "LESS_THAN",
            FilterOp::Lte => "LESS_THAN_OR_EQUAL",
            FilterOp::Gt => "GREATER_THAN",
            FilterOp::Gte => "GREATER_THAN_OR_EQUAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Lt, value)
    }

    /// Missing fields never match
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };
        match (self.op, compare_values(actual, &self.value)) {
            (FilterOp::Eq, Some(o)) => o == Ordering::Equal,
            (FilterOp::Lt, Some(o)) => o == Ordering::Less,
            (FilterOp::Lte, Some(o)) => o != Ordering::Greater,
            (FilterOp::Gt, Some(o)) => o == Ordering::Greater,
            (FilterOp::Gte, Some(o)) => o != Ordering::Less,
            (_, None) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(FieldFilter::eq(field, value))
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter, sort and limit documents in memory
    ///
    /// Sorting is stable; documents missing the order field sort first.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs
            .into_iter()
            .filter(|doc| self.filters.iter().all(|f| f.matches(&doc.fields)))
            .collect();

        if let Some(order) = &self.order_by {
            matched.sort_by(|a, b| {
                let ordering = match (a.get(&order.field), b.get(&order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Compare two JSON values of the same kind
///
/// Numbers compare numerically and strings lexicographically (RFC 3339
/// timestamps in UTC therefore sort chronologically). Mixed kinds are
/// incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Collection-oriented document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Back end name for health output
    fn name(&self) -> &'static str;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SdkError>;

    /// Create or overwrite a document
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), SdkError>;

    /// Create a document under a generated id
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, SdkError>;

    /// Merge top-level fields into an existing document
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), SdkError>;

    /// Deleting a missing document is not an error
    async fn delete(&self, collection: &str, id: &str) -> Result<(), SdkError>;

    async fn remove_field(&self, collection: &str, id: &str, field: &str) -> Result<(), SdkError>;

    async fn query(&self, query: &Query) -> Result<Vec<Document>, SdkError>;

    /// Cheap round trip used by readiness checks
    async fn ping(&self) -> Result<(), SdkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_filters() {
        let d = doc("a", json!({"room_id": "r1", "watts": 120.5, "timestamp": "2024-05-01T08:00:00Z"}));

        assert!(FieldFilter::eq("room_id", "r1").matches(&d.fields));
        assert!(!FieldFilter::eq("room_id", "r2").matches(&d.fields));
        assert!(FieldFilter::gte("watts", 120.5).matches(&d.fields));
        assert!(FieldFilter::lt("timestamp", "2024-06-01T00:00:00Z").matches(&d.fields));
        assert!(!FieldFilter::eq("missing", "x").matches(&d.fields));
        // mixed kinds never match
        assert!(!FieldFilter::eq("watts", "120.5").matches(&d.fields));
    }

    #[test]
    fn test_apply_orders_and_limits() {
        let docs = vec![
            doc("a", json!({"month": "2024-04", "room_id": "r1"})),
            doc("b", json!({"month": "2024-06", "room_id": "r1"})),
            doc("c", json!({"month": "2024-05", "room_id": "r1"})),
            doc("d", json!({"month": "2024-07", "room_id": "r2"})),
        ];

        let query = Query::collection("bills")
            .where_eq("room_id", "r1")
            .order_by("month", Direction::Descending)
            .limit(2);
        let ids: Vec<String> = query.apply(docs).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_decode_injects_id() {
        #[derive(serde::Deserialize)]
        struct Named {
            id: String,
            name: String,
        }

        let named: Named = doc("u1", json!({"name": "Ayu"})).decode().unwrap();
        assert_eq!(named.id, "u1");
        assert_eq!(named.name, "Ayu");
    }

    #[test]
    fn test_to_fields_drops_id() {
        let fields = to_fields(&json!({"id": "x", "number": "101"})).unwrap();
        assert!(!fields.contains_key("id"));
        assert!(to_fields(&json!([1, 2])).is_err());
    }
}

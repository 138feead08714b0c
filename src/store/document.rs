use anyhow::Result;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document body (the id lives outside the body)
pub type Document = Map<String, Value>;

/// A document together with the id it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

/// Field predicate applied by `query`
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    NotEq(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn not_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::NotEq(field.into(), value.into())
    }

    /// Check a document against this predicate.
    ///
    /// Like managed document stores, an inequality never matches a document
    /// that lacks the field.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::NotEq(field, value) => doc.get(field).is_some_and(|v| v != value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Filtered, ordered, limited read of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A single write inside an atomic commit
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or fully replace a document
    Set {
        collection: String,
        id: String,
        data: Document,
    },
    /// Merge fields into an existing document; fails if the document is absent
    Update {
        collection: String,
        id: String,
        fields: Document,
    },
    /// Precondition: no document other than `id` has `field == value`, and
    /// `id` itself is absent or has `field == value`. Checked against the
    /// state before the batch; fails the commit with `ClaimConflict`.
    Claim {
        collection: String,
        id: String,
        field: String,
        value: Value,
    },
}

/// A `Write::Claim` precondition did not hold
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{collection}/{holder} already holds {field}={value}")]
pub struct ClaimConflict {
    pub collection: String,
    pub field: String,
    pub value: Value,

    /// Document that holds the value, or carries a different one under the claimed id
    pub holder: String,
}

/// Document store backend trait
///
/// Implementations:
/// - `MemoryStore`: process-local collections (tests, single-node deployments)
/// - Managed databases: any backend offering get/set/update/query and batched writes
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Allocate a fresh document id
    fn new_id(&self) -> String;

    /// Fetch a single document, `None` if absent
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create or fully replace a document
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<()>;

    /// Merge fields into an existing document
    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()>;

    /// Run a filtered/ordered/limited query
    async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>>;

    /// Apply every write or none of them
    async fn commit(&self, writes: Vec<Write>) -> Result<()>;
}

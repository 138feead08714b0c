use super::document::{
    ClaimConflict, Direction, Document, DocumentStore, Query, StoredDocument, Write,
};
use anyhow::{bail, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type Collection = BTreeMap<String, Document>;

/// In-process document store
///
/// All collections sit behind one lock, so a `commit` is observed either
/// completely or not at all.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in a collection
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, |c| c.len())
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<()> {
        self.commit(vec![Write::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        }])
        .await
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        self.commit(vec![Write::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        }])
        .await
    }

    async fn query(&self, query: &Query) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<StoredDocument> = collection
            .iter()
            .filter(|(_, doc)| query.filters.iter().all(|f| f.matches(doc)))
            .map(|(id, doc)| StoredDocument {
                id: id.clone(),
                data: doc.clone(),
            })
            .collect();

        if !query.order_by.is_empty() {
            matches.sort_by(|a, b| {
                for order in &query.order_by {
                    let ord = compare_values(a.data.get(&order.field), b.data.get(&order.field));
                    let ord = match order.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }

        debug!(
            "Query on {} returned {} documents",
            query.collection,
            matches.len()
        );

        Ok(matches)
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        let mut collections = self.collections.write().await;

        // Validate the whole batch before touching anything
        for (index, write) in writes.iter().enumerate() {
            match write {
                Write::Update { collection, id, .. } => {
                    let exists = collections
                        .get(collection)
                        .is_some_and(|c| c.contains_key(id));
                    let created_earlier = writes[..index].iter().any(|w| {
                        matches!(w, Write::Set { collection: c, id: i, .. } if c == collection && i == id)
                    });
                    if !exists && !created_earlier {
                        bail!("Cannot update missing document {}/{}", collection, id);
                    }
                }
                Write::Claim {
                    collection,
                    id,
                    field,
                    value,
                } => {
                    if let Some(holder) = collections
                        .get(collection)
                        .and_then(|c| claim_holder(c, id, field, value))
                    {
                        debug!("Claim {}={} on {}/{} refused", field, value, collection, id);
                        return Err(ClaimConflict {
                            collection: collection.clone(),
                            field: field.clone(),
                            value: value.clone(),
                            holder,
                        }
                        .into());
                    }
                }
                Write::Set { .. } => {}
            }
        }

        for write in writes {
            match write {
                Write::Set {
                    collection,
                    id,
                    data,
                } => {
                    collections.entry(collection).or_default().insert(id, data);
                }
                Write::Update {
                    collection,
                    id,
                    fields,
                } => {
                    if let Some(doc) = collections
                        .get_mut(&collection)
                        .and_then(|c| c.get_mut(&id))
                    {
                        doc.extend(fields);
                    }
                }
                Write::Claim { .. } => {}
            }
        }

        Ok(())
    }
}

/// Document blocking a claim of `field == value` for `id`, if any
fn claim_holder(collection: &Collection, id: &str, field: &str, value: &Value) -> Option<String> {
    collection.iter().find_map(|(doc_id, doc)| {
        let holds = doc.get(field) == Some(value);
        let blocks = if doc_id == id { !holds } else { holds };
        blocks.then(|| doc_id.clone())
    })
}

/// Total order over optional JSON values: missing < null < bool < number < string < other
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

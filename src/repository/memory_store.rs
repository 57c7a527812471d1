//! In-process Remote Collection
//!
//! Holds documents in memory and pushes a full snapshot to every live
//! subscriber after each write. Used for local runs and tests; supports
//! failure injection for writes, subscriptions and live streams.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::domain::ItemId;

use super::traits::{RemoteCollection, RemoteDocument, Snapshot, SnapshotStream, StoreError, StoreResult};

struct StoredDocument {
    id: String,
    fields: Map<String, Value>,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    documents: Vec<StoredDocument>,
    next_id: u64,
    last_timestamp: Option<DateTime<Utc>>,
    subscribers: Vec<mpsc::UnboundedSender<StoreResult<Snapshot>>>,
    fail_writes: Option<StoreError>,
    fail_subscribe: Option<StoreError>,
}

impl Inner {
    /// Strictly increasing store clock
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(stamp);
        stamp
    }

    fn snapshot(&self) -> Snapshot {
        let mut ordered: Vec<&StoredDocument> = self.documents.iter().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Snapshot::new(
            ordered
                .into_iter()
                .map(|doc| RemoteDocument::new(doc.id.clone(), doc.fields.clone()))
                .collect(),
        )
    }

    fn broadcast(&mut self) {
        let snapshot = self.snapshot();
        self.subscribers.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
        debug!("Memory store broadcast {} documents", snapshot.len());
    }
}

fn timestamp_value(stamp: DateTime<Utc>) -> Value {
    Value::String(stamp.to_rfc3339())
}

/// In-memory implementation of the inventory collection
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail with `error`; `None` restores writes
    pub async fn fail_writes(&self, error: Option<StoreError>) {
        self.inner.lock().await.fail_writes = error;
    }

    /// Make every following subscribe fail with `error`; `None` restores it
    pub async fn fail_subscribe(&self, error: Option<StoreError>) {
        self.inner.lock().await.fail_subscribe = error;
    }

    /// Break every live subscription with `error`
    pub async fn interrupt(&self, error: StoreError) {
        let mut inner = self.inner.lock().await;
        for tx in inner.subscribers.drain(..) {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// Store `fields` verbatim under `id`, bypassing item encoding.
    ///
    /// Only `createdAt` is stamped, so malformed documents can be seeded.
    pub async fn insert_raw(&self, id: &str, mut fields: Map<String, Value>) {
        let mut inner = self.inner.lock().await;
        let created_at = inner.tick();
        fields.insert("createdAt".to_string(), timestamp_value(created_at));
        inner.documents.push(StoredDocument {
            id: id.to_string(),
            fields,
            created_at,
        });
        inner.broadcast();
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Fields of a stored document
    pub async fn document(&self, id: &ItemId) -> Option<Map<String, Value>> {
        let inner = self.inner.lock().await;
        inner
            .documents
            .iter()
            .find(|doc| doc.id == id.as_str())
            .map(|doc| doc.fields.clone())
    }

    /// Current subscriber count
    /// Latest timestamp handed out by the store clock
    pub async fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.last_timestamp
    }

    pub async fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }
}

#[async_trait]
impl RemoteCollection for MemoryStore {
    async fn subscribe(&self) -> StoreResult<SnapshotStream> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.fail_subscribe.clone() {
            return Err(error);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive, the send cannot fail
        let _ = tx.send(Ok(inner.snapshot()));
        inner.subscribers.push(tx);
        Ok(SnapshotStream::new(rx))
    }

    async fn insert(&self, mut fields: Map<String, Value>) -> StoreResult<ItemId> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.fail_writes.clone() {
            return Err(error);
        }

        inner.next_id += 1;
        let id = format!("item-{}", inner.next_id);
        let created_at = inner.tick();
        fields.insert("createdAt".to_string(), timestamp_value(created_at));
        fields.insert("updatedAt".to_string(), timestamp_value(created_at));

        inner.documents.push(StoredDocument {
            id: id.clone(),
            fields,
            created_at,
        });
        debug!("Memory store inserted {}", id);
        inner.broadcast();
        Ok(ItemId::new(id))
    }

    async fn update(&self, id: &ItemId, patch: Map<String, Value>) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(error) = inner.fail_writes.clone() {
            return Err(error);
        }

        let index = inner
            .documents
            .iter()
            .position(|doc| doc.id == id.as_str())
            .ok_or_else(|| StoreError::Rejected {
                status: 404,
                message: format!("document {id} not found"),
            })?;

        let updated_at = inner.tick();
        let doc = &mut inner.documents[index];
        doc.fields.extend(patch);
        doc.fields.insert("updatedAt".to_string(), timestamp_value(updated_at));
        debug!("Memory store updated {}", id);
        inner.broadcast();
        Ok(())
    }
}

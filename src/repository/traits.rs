//! Repository Layer - Remote Collection Port
//!
//! Abstract interface to the remote document collection that holds the
//! inventory. Implementations: in-process memory store, Firestore REST.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::{DecodeError, InventoryItem, ItemId};

/// Failures reported by a remote collection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("subscription closed")]
    Closed,
}

/// Common result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// One stored document: identity plus plain JSON fields
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode into a typed inventory item
    pub fn decode(&self) -> Result<InventoryItem, DecodeError> {
        InventoryItem::decode(&self.id, &self.fields)
    }
}

/// Full point-in-time view of the collection, newest first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub documents: Vec<RemoteDocument>,
}

impl Snapshot {
    pub fn new(documents: Vec<RemoteDocument>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Ordered stream of snapshots for one subscription.
///
/// Dropping the stream ends the subscription and stops any listener task
/// that feeds it.
pub struct SnapshotStream {
    rx: mpsc::UnboundedReceiver<StoreResult<Snapshot>>,
    task: Option<JoinHandle<()>>,
}

impl SnapshotStream {
    pub fn new(rx: mpsc::UnboundedReceiver<StoreResult<Snapshot>>) -> Self {
        Self { rx, task: None }
    }

    /// Stream fed by a background listener task
    pub fn with_task(rx: mpsc::UnboundedReceiver<StoreResult<Snapshot>>, task: JoinHandle<()>) -> Self {
        Self { rx, task: Some(task) }
    }

    /// Next notification; `None` once the store closed the subscription
    pub async fn next(&mut self) -> Option<StoreResult<Snapshot>> {
        self.rx.recv().await
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Remote document collection holding inventory items
///
/// Stores assign `createdAt` and `updatedAt` at write time and deliver
/// snapshots ordered by `createdAt`, newest first.
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Open a listener; the first notification is the current contents
    async fn subscribe(&self) -> StoreResult<SnapshotStream>;

    /// Write a new document and return its assigned identity
    async fn insert(&self, fields: Map<String, Value>) -> StoreResult<ItemId>;

    /// Merge `patch` into an existing document
    async fn update(&self, id: &ItemId, patch: Map<String, Value>) -> StoreResult<()>;
}

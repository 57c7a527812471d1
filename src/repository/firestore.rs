//! Firestore REST Remote Collection
//!
//! Reads run a structured query ordered by `createdAt` descending. Listening is
//! done by polling that query and emitting a snapshot whenever the result
//! changes. Writes go through `:commit` so the server stamps `createdAt` and
//! `updatedAt` with its own request time.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::ItemId;

use super::firestore_value::{fields_from_plain, fields_to_plain};
use super::traits::{RemoteCollection, RemoteDocument, Snapshot, SnapshotStream, StoreError, StoreResult};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Connection settings for one Firestore collection
#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub poll_interval: Duration,
}

impl FirestoreSettings {
    pub fn new(project_id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: "(default)".to_string(),
            api_key: None,
            collection: collection.into(),
            poll_interval: Duration::from_secs(2),
        }
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database)
    }

    /// Full resource name of a document in the collection
    pub fn document_name(&self, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path(), self.collection, id)
    }

    fn endpoint(&self, method: &str) -> String {
        let url = format!("{}/{}/documents:{}", self.base_url.trim_end_matches('/'), self.database_path(), method);
        match &self.api_key {
            Some(key) => format!("{url}?key={key}"),
            None => url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Firestore-backed inventory collection
#[derive(Clone)]
pub struct FirestoreStore {
    client: Client,
    settings: FirestoreSettings,
}

impl FirestoreStore {
    pub fn new(settings: FirestoreSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &FirestoreSettings {
        &self.settings
    }

    /// One read of the whole collection, newest first
    pub async fn fetch_snapshot(&self) -> StoreResult<Snapshot> {
        let response = self
            .client
            .post(self.settings.endpoint("runQuery"))
            .json(&structured_query(&self.settings.collection))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let entries: Vec<RunQueryEntry> = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Protocol(e.to_string()))?;

        snapshot_from_entries(entries)
    }

    async fn commit(&self, writes: Vec<Value>) -> StoreResult<()> {
        let response = self
            .client
            .post(self.settings.endpoint("commit"))
            .json(&json!({ "writes": writes }))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteCollection for FirestoreStore {
    async fn subscribe(&self) -> StoreResult<SnapshotStream> {
        let initial = self.fetch_snapshot().await?;
        info!(
            "Listening to {} ({} documents, polling every {:?})",
            self.settings.collection,
            initial.len(),
            self.settings.poll_interval
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(initial.clone()));

        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut last = initial;
            loop {
                tokio::time::sleep(store.settings.poll_interval).await;
                if tx.is_closed() {
                    break;
                }
                match store.fetch_snapshot().await {
                    Ok(snapshot) if snapshot == last => {}
                    Ok(snapshot) => {
                        debug!("Collection changed: {} documents", snapshot.len());
                        if tx.send(Ok(snapshot.clone())).is_err() {
                            break;
                        }
                        last = snapshot;
                    }
                    Err(e) => {
                        warn!("Listener for {} failed: {}", store.settings.collection, e);
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });

        Ok(SnapshotStream::with_task(rx, task))
    }

    async fn insert(&self, fields: Map<String, Value>) -> StoreResult<ItemId> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let name = self.settings.document_name(&id);
        self.commit(vec![insert_write(&name, &fields)]).await?;
        Ok(ItemId::new(id))
    }

    async fn update(&self, id: &ItemId, patch: Map<String, Value>) -> StoreResult<()> {
        let name = self.settings.document_name(id.as_str());
        self.commit(vec![update_write(&name, &patch)]).await
    }
}

fn structured_query(collection: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }]
        }
    })
}

fn server_time(field: &str) -> Value {
    json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" })
}

fn insert_write(name: &str, fields: &Map<String, Value>) -> Value {
    json!({
        "update": { "name": name, "fields": fields_from_plain(fields) },
        "updateTransforms": [server_time("createdAt"), server_time("updatedAt")],
        "currentDocument": { "exists": false }
    })
}

fn update_write(name: &str, patch: &Map<String, Value>) -> Value {
    let paths: Vec<&String> = patch.keys().collect();
    json!({
        "update": { "name": name, "fields": fields_from_plain(patch) },
        "updateMask": { "fieldPaths": paths },
        "updateTransforms": [server_time("updatedAt")],
        "currentDocument": { "exists": true }
    })
}

fn snapshot_from_entries(entries: Vec<RunQueryEntry>) -> StoreResult<Snapshot> {
    entries
        .into_iter()
        .filter_map(|entry| entry.document)
        .map(|doc| {
            let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
            Ok(RemoteDocument::new(id, fields_to_plain(&doc.fields)?))
        })
        .collect::<StoreResult<Vec<_>>>()
        .map(Snapshot::new)
}

async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(status_error(status, message))
}

/// Map a failed HTTP status onto the store's error kinds
fn status_error(status: StatusCode, message: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Permission(message),
        // Quota and timeout failures clear up on their own
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::Transport(format!("{status}: {message}"))
        }
        s if s.is_client_error() => StoreError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => StoreError::Transport(format!("{s}: {message}")),
    }
}

//! Repository Integration Tests
//!
//! Tests for MemoryStore through the RemoteCollection port.

#[cfg(test)]
mod tests {
    use crate::domain::{ItemId, ItemStatus, NewItemRequest};
    use crate::repository::{MemoryStore, RemoteCollection, StoreError};
    use serde_json::{json, Map, Value};

    fn request(title: &str) -> Map<String, Value> {
        let request = NewItemRequest {
            title: title.to_string(),
            genre: "アウター".to_string(),
            price: 100,
            ..Default::default()
        };
        request.to_fields("アウター-001")
    }

    fn titles(snapshot: &crate::repository::Snapshot) -> Vec<String> {
        snapshot
            .documents
            .iter()
            .map(|d| d.fields["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_contents_first() {
        let store = MemoryStore::new();
        store.insert(request("Coat")).await.expect("insert");

        let mut stream = store.subscribe().await.expect("subscribe");
        let first = stream.next().await.expect("notification").expect("snapshot");
        assert_eq!(titles(&first), vec!["Coat"]);
    }

    #[tokio::test]
    async fn test_snapshots_are_newest_first() {
        let store = MemoryStore::new();
        let mut stream = store.subscribe().await.unwrap();
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        store.insert(request("First")).await.unwrap();
        store.insert(request("Second")).await.unwrap();

        let _ = stream.next().await.unwrap().unwrap();
        let latest = stream.next().await.unwrap().unwrap();
        assert_eq!(titles(&latest), vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_insert_assigns_identity_and_timestamps() {
        let store = MemoryStore::new();
        let first = store.insert(request("A")).await.unwrap();
        let second = store.insert(request("B")).await.unwrap();
        assert_ne!(first, second);

        let doc = store.document(&first).await.expect("stored");
        assert!(doc.contains_key("createdAt"));
        assert!(doc.contains_key("updatedAt"));

        let decoded = crate::repository::RemoteDocument::new(first.as_str(), doc)
            .decode()
            .expect("decodes");
        assert_eq!(decoded.title, "A");
        assert!(decoded.created_at.is_some());
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = MemoryStore::new();
        let id = store.insert(request("Coat")).await.unwrap();

        let mut patch = Map::new();
        patch.insert("status".to_string(), json!(ItemStatus::OnHold.label()));
        store.update(&id, patch).await.expect("update");

        let doc = store.document(&id).await.unwrap();
        assert_eq!(doc["status"], json!("保留"));
        assert_eq!(doc["title"], json!("Coat"));
    }

    #[tokio::test]
    async fn test_update_unknown_document_is_rejected() {
        let store = MemoryStore::new();
        let err = store.update(&ItemId::new("missing"), Map::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_failed_update_does_not_advance_clock() {
        let store = MemoryStore::new();
        store.insert(request("Coat")).await.unwrap();
        let before = store.last_timestamp().await;
        assert!(before.is_some());

        let err = store.update(&ItemId::new("missing"), Map::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 404, .. }));
        assert_eq!(store.last_timestamp().await, before);
    }

    #[tokio::test]
    async fn test_failing_writes_leave_collection_untouched() {
        let store = MemoryStore::new();
        store
            .fail_writes(Some(StoreError::Permission("read-only".to_string())))
            .await;

        let err = store.insert(request("Coat")).await.unwrap_err();
        assert_eq!(err, StoreError::Permission("read-only".to_string()));
        assert!(store.is_empty().await);

        store.fail_writes(None).await;
        assert!(store.insert(request("Coat")).await.is_ok());
    }

    #[tokio::test]
    async fn test_interrupt_reports_error_to_subscribers() {
        let store = MemoryStore::new();
        let mut stream = store.subscribe().await.unwrap();
        let _ = stream.next().await;

        store.interrupt(StoreError::Transport("reset".to_string())).await;
        let next = stream.next().await.expect("error notification");
        assert_eq!(next.unwrap_err(), StoreError::Transport("reset".to_string()));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_stream_unsubscribes() {
        let store = MemoryStore::new();
        let stream = store.subscribe().await.unwrap();
        assert_eq!(store.subscriber_count().await, 1);
        drop(stream);
        assert_eq!(store.subscriber_count().await, 0);
    }
}

//! Item Mutation Commands
//!
//! Writes new items and field updates to the remote collection. New items get
//! their stock code here and, with the optimistic strategy, appear in the
//! local list as soon as the write succeeds.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::domain::{GenreCatalog, InventoryItem, ItemId, ItemStatus, NewItemRequest};
use crate::error::MutationError;
use crate::repository::RemoteCollection;
use crate::store::SyncEngine;

/// How a successful insert reaches the local list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EchoStrategy {
    /// Wait for the next snapshot to list the item
    AwaitSnapshot,
    /// List the item immediately; the next snapshot replaces it
    #[default]
    Optimistic,
}

/// Mutation gateway for inventory items
pub struct MutationGateway {
    remote: Arc<dyn RemoteCollection>,
    engine: Arc<SyncEngine>,
    catalog: GenreCatalog,
    echo: EchoStrategy,
}

impl MutationGateway {
    pub fn new(remote: Arc<dyn RemoteCollection>, engine: Arc<SyncEngine>, catalog: GenreCatalog) -> Self {
        Self {
            remote,
            engine,
            catalog,
            echo: EchoStrategy::default(),
        }
    }

    pub fn with_echo(mut self, echo: EchoStrategy) -> Self {
        self.echo = echo;
        self
    }

    pub fn catalog(&self) -> &GenreCatalog {
        &self.catalog
    }

    /// Write a new item.
    ///
    /// The request is trusted to be validated. On failure nothing local changes.
    pub async fn submit(&self, request: NewItemRequest) -> Result<InventoryItem, MutationError> {
        let stock_code = self.catalog.stock_code(&request.genre);
        let fields = request.to_fields(&stock_code);

        let id = self.remote.insert(fields).await.map_err(|e| {
            error!("Failed to add {} ({}): {}", request.title, stock_code, e);
            MutationError::from(e)
        })?;

        let item = InventoryItem::from_request(id, stock_code, request);
        info!("Added {} as {} ({})", item.title, item.id, item.stock_code);

        if self.echo == EchoStrategy::Optimistic {
            self.engine.prepend_optimistic(item.clone());
        }
        Ok(item)
    }

    /// Record the latest markdown day of an item
    pub async fn update_discount_date(&self, id: &ItemId, date: NaiveDate) -> Result<(), MutationError> {
        self.patch(id, "discountDate", json!(date)).await
    }

    /// Move an item to another sales status
    pub async fn update_status(&self, id: &ItemId, status: ItemStatus) -> Result<(), MutationError> {
        self.patch(id, "status", json!(status)).await
    }

    async fn patch(&self, id: &ItemId, field: &str, value: Value) -> Result<(), MutationError> {
        let mut patch = Map::new();
        patch.insert(field.to_string(), value);

        self.remote.update(id, patch).await.map_err(|e| {
            error!("Failed to update {} of {}: {}", field, id, e);
            MutationError::from(e)
        })?;
        info!("Updated {} of {}", field, id);
        Ok(())
    }
}

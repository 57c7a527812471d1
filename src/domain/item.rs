//! Inventory Item Entity
//!
//! The canonical record held in the synchronized list, plus the typed
//! document shape used to decode and encode it at the store boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::entity::Entity;

/// Opaque identity assigned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Sales status of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    /// Listed and available
    #[default]
    #[serde(rename = "販売中", alias = "for-sale")]
    ForSale,
    /// Reserved or already sold
    #[serde(rename = "売約済", alias = "reserved-sold")]
    ReservedSold,
    /// Temporarily withdrawn
    #[serde(rename = "保留", alias = "on-hold")]
    OnHold,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [ItemStatus::ForSale, ItemStatus::ReservedSold, ItemStatus::OnHold];

    /// Value stored in the remote document
    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::ForSale => "販売中",
            ItemStatus::ReservedSold => "売約済",
            ItemStatus::OnHold => "保留",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::ForSale => "for-sale",
            ItemStatus::ReservedSold => "reserved-sold",
            ItemStatus::OnHold => "on-hold",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s || status.label() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Marketplaces an item can be listed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marketplace {
    Mercari,
    Yahoo,
    Rakuma,
    Instagram,
}

impl Marketplace {
    pub const ALL: [Marketplace; 4] = [
        Marketplace::Mercari,
        Marketplace::Yahoo,
        Marketplace::Rakuma,
        Marketplace::Instagram,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Marketplace::Mercari => "mercari",
            Marketplace::Yahoo => "yahoo",
            Marketplace::Rakuma => "rakuma",
            Marketplace::Instagram => "instagram",
        }
    }
}

/// Listing flags; entries missing from a document read as `false`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Marketplaces {
    pub mercari: bool,
    pub yahoo: bool,
    pub rakuma: bool,
    pub instagram: bool,
}

impl Marketplaces {
    pub fn get(&self, marketplace: Marketplace) -> bool {
        match marketplace {
            Marketplace::Mercari => self.mercari,
            Marketplace::Yahoo => self.yahoo,
            Marketplace::Rakuma => self.rakuma,
            Marketplace::Instagram => self.instagram,
        }
    }

    pub fn set(&mut self, marketplace: Marketplace, listed: bool) {
        let flag = match marketplace {
            Marketplace::Mercari => &mut self.mercari,
            Marketplace::Yahoo => &mut self.yahoo,
            Marketplace::Rakuma => &mut self.rakuma,
            Marketplace::Instagram => &mut self.instagram,
        };
        *flag = listed;
    }

    pub fn toggle(&mut self, marketplace: Marketplace) {
        let listed = self.get(marketplace);
        self.set(marketplace, !listed);
    }

    /// Marketplaces currently flagged, in catalog order
    pub fn enabled(&self) -> Vec<Marketplace> {
        Marketplace::ALL.into_iter().filter(|m| self.get(*m)).collect()
    }
}

/// Inventory record as shown in the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    /// Genre-derived label, not unique
    pub stock_code: String,
    pub title: String,
    pub genre: String,
    pub status: ItemStatus,
    pub price: u64,
    pub sold_date: Option<NaiveDate>,
    pub discount_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub marketplaces: Marketplaces,
    /// Assigned by the store; `None` until the write is confirmed
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }
}

/// Data collected by the add-item form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewItemRequest {
    pub title: String,
    pub genre: String,
    pub status: ItemStatus,
    pub price: u64,
    pub sold_date: Option<NaiveDate>,
    pub discount_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub marketplaces: Marketplaces,
}

/// A stored document that does not fit the item shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("document {id} is malformed: {reason}")]
pub struct DecodeError {
    pub id: String,
    pub reason: String,
}

/// Document fields as persisted in the `inventoryItems` collection
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemDocument {
    sku: String,
    title: String,
    genre: String,
    status: ItemStatus,
    price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sold_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discount_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default)]
    marketplaces: Option<Marketplaces>,
    #[serde(default, skip_serializing)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    updated_at: Option<DateTime<Utc>>,
}

impl InventoryItem {
    /// Decode a stored document into a typed item.
    ///
    /// Fails on missing or mistyped fields and on a blank title.
    pub fn decode(id: &str, fields: &Map<String, Value>) -> Result<Self, DecodeError> {
        let malformed = |reason: String| DecodeError {
            id: id.to_string(),
            reason,
        };

        let doc: ItemDocument = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| malformed(e.to_string()))?;

        if doc.title.trim().is_empty() {
            return Err(malformed("title is empty".to_string()));
        }

        Ok(Self {
            id: ItemId::new(id),
            stock_code: doc.sku,
            title: doc.title,
            genre: doc.genre,
            status: doc.status,
            price: doc.price,
            sold_date: doc.sold_date,
            discount_date: doc.discount_date,
            image: doc.image,
            marketplaces: doc.marketplaces.unwrap_or_default(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    /// Build the local record for a freshly written request
    pub fn from_request(id: ItemId, stock_code: String, request: NewItemRequest) -> Self {
        Self {
            id,
            stock_code,
            title: request.title,
            genre: request.genre,
            status: request.status,
            price: request.price,
            sold_date: request.sold_date,
            discount_date: request.discount_date,
            image: request.image,
            marketplaces: request.marketplaces,
            created_at: None,
            updated_at: None,
        }
    }
}

impl NewItemRequest {
    /// Encode the request as document fields, without store-assigned timestamps
    pub fn to_fields(&self, stock_code: &str) -> Map<String, Value> {
        let doc = ItemDocument {
            sku: stock_code.to_string(),
            title: self.title.clone(),
            genre: self.genre.clone(),
            status: self.status,
            price: self.price,
            sold_date: self.sold_date,
            discount_date: self.discount_date,
            image: self.image.clone(),
            marketplaces: Some(self.marketplaces),
            created_at: None,
            updated_at: None,
        };
        match serde_json::to_value(doc) {
            Ok(Value::Object(fields)) => fields,
            // A derived struct serializer always yields an object
            _ => Map::new(),
        }
    }
}

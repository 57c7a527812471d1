//! Domain Layer
//!
//! Inventory entities, the genre catalog and the filter predicate.
//! Nothing here performs I/O.

mod entity;
mod filter;
mod genre;
mod item;

pub use entity::{contains_id, dedupe_by_id, Entity};
pub use filter::{apply, matches, FilterState};
pub use genre::{generate_stock_code, GenreCatalog, DEFAULT_GENRES};
pub use item::{
    DecodeError, InventoryItem, ItemId, ItemStatus, Marketplace, Marketplaces, NewItemRequest,
    UnknownStatus,
};

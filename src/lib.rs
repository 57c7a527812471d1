//! Inventory Sync Core
//!
//! Layered architecture:
//! - domain: Inventory items, genres, stock codes and filtering
//! - repository: Remote collection abstraction with in-memory and Firestore backends
//! - store: Synchronization engine holding the local list
//! - commands: Add-item form validation and mutation gateway
//! - context: Per-screen filter state and derived visible list

pub mod commands;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod logging;
pub mod repository;
pub mod store;

pub use commands::{EchoStrategy, ItemForm, MutationGateway, ValidationError};
pub use config::{Backend, ConfigError, InventoryConfig};
pub use context::{InventoryContext, VisibleItems};
pub use error::{MutationError, SyncError};
pub use store::{SyncEngine, SyncState, SyncStatus};

//! Repository Layer
//!
//! The remote collection port and its implementations.

mod firestore;
mod firestore_value;
mod memory_store;
mod traits;

#[cfg(test)]
mod tests;

pub use firestore::{FirestoreSettings, FirestoreStore, DEFAULT_BASE_URL};
pub use memory_store::MemoryStore;
pub use traits::{RemoteCollection, RemoteDocument, Snapshot, SnapshotStream, StoreError, StoreResult};

//! Synchronized Inventory Store
//!
//! Bridges the remote collection's snapshot stream into one ordered local
//! list, newest first. Every snapshot replaces the list wholesale, so an
//! optimistic entry lives only until the next snapshot supersedes it.
//! Observers follow changes through a `watch` channel.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{contains_id, dedupe_by_id, DecodeError, InventoryItem};
use crate::error::SyncError;
use crate::repository::{RemoteCollection, Snapshot, SnapshotStream, StoreError};

/// Subscription health as seen by the screen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Never started
    #[default]
    Idle,
    /// Subscribed, waiting for the first snapshot
    Connecting,
    /// Following the remote collection
    Live,
    /// Subscription failed; `items` holds the last known list
    Degraded(SyncError),
    /// Released by `stop`
    Stopped,
}

/// Local projection of the remote collection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncState {
    /// Items, newest first, at most one per id
    pub items: Vec<InventoryItem>,
    pub status: SyncStatus,
    /// Documents of the latest snapshot that failed to decode
    pub rejected: Vec<DecodeError>,
    /// Bumped on every published change
    pub revision: u64,
}

impl SyncState {
    pub fn is_live(&self) -> bool {
        self.status == SyncStatus::Live
    }
}

/// Running pump plus a counter bumped by every `start` and `stop`
#[derive(Default)]
struct PumpSlot {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

/// Synchronization engine for the inventory collection
pub struct SyncEngine {
    remote: Arc<dyn RemoteCollection>,
    state: Arc<watch::Sender<SyncState>>,
    pump: Mutex<PumpSlot>,
}

impl SyncEngine {
    pub fn new(remote: Arc<dyn RemoteCollection>) -> Self {
        let (state, _) = watch::channel(SyncState::default());
        Self {
            remote,
            state: Arc::new(state),
            pump: Mutex::new(PumpSlot::default()),
        }
    }

    /// Subscribe to the remote collection and apply its snapshots in order.
    ///
    /// A `stop` issued while the subscription is being opened wins: the new
    /// subscription is released and `Cancelled` is returned.
    pub async fn start(&self) -> Result<(), SyncError> {
        let generation = {
            let mut slot = self.lock_pump();
            if slot.handle.as_ref().is_some_and(|pump| !pump.is_finished()) {
                return Err(SyncError::AlreadyStarted);
            }
            slot.generation += 1;
            slot.generation
        };

        set_status(&self.state, SyncStatus::Connecting);
        let subscribed = self.remote.subscribe().await;

        let mut slot = self.lock_pump();
        if slot.generation != generation {
            debug!("Inventory sync start cancelled while subscribing");
            return Err(SyncError::Cancelled);
        }

        let stream = match subscribed {
            Ok(stream) => stream,
            Err(e) => {
                let err = SyncError::Subscribe(e);
                degrade(&self.state, err.clone());
                return Err(err);
            }
        };

        let handle = tokio::spawn(pump(stream, Arc::clone(&self.state)));
        if let Some(previous) = slot.handle.replace(handle) {
            previous.abort();
        }
        info!("Inventory sync started");
        Ok(())
    }

    /// Release the subscription. Safe to call repeatedly, before `start`, or
    /// while `start` is still subscribing.
    pub fn stop(&self) {
        let handle = {
            let mut slot = self.lock_pump();
            slot.generation += 1;
            slot.handle.take()
        };
        if let Some(handle) = handle {
            handle.abort();
            info!("Inventory sync stopped");
        }
        set_status(&self.state, SyncStatus::Stopped);
    }

    /// Replace the local list with `snapshot`
    pub fn apply_snapshot(&self, snapshot: Snapshot) {
        replace_with_snapshot(&self.state, snapshot);
    }

    /// Show a freshly written item before its snapshot arrives.
    ///
    /// Returns false when the item is already listed or the engine is stopped.
    pub fn prepend_optimistic(&self, item: InventoryItem) -> bool {
        let id = item.id.clone();
        let applied = self.state.send_if_modified(|state| {
            if state.status == SyncStatus::Stopped || contains_id(&state.items, &item.id) {
                return false;
            }
            state.items.insert(0, item);
            state.revision += 1;
            true
        });
        if applied {
            debug!("Optimistically listed {}", id);
        }
        applied
    }

    /// New observer of state changes
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Copy of the current list
    pub fn items(&self) -> Vec<InventoryItem> {
        self.state.borrow().items.clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.state.borrow().status.clone()
    }

    fn lock_pump(&self) -> MutexGuard<'_, PumpSlot> {
        self.pump.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_pump().handle.take() {
            handle.abort();
        }
    }
}

// ========================
// Store Helper Functions
// ========================

async fn pump(mut stream: SnapshotStream, state: Arc<watch::Sender<SyncState>>) {
    loop {
        match stream.next().await {
            Some(Ok(snapshot)) => replace_with_snapshot(&state, snapshot),
            Some(Err(e)) => {
                degrade(&state, SyncError::Interrupted(e));
                break;
            }
            None => {
                degrade(&state, SyncError::Interrupted(StoreError::Closed));
                break;
            }
        }
    }
}

/// Decode a snapshot and publish it as the whole list
fn replace_with_snapshot(state: &watch::Sender<SyncState>, snapshot: Snapshot) {
    let mut items = Vec::with_capacity(snapshot.len());
    let mut rejected = Vec::new();
    for document in &snapshot.documents {
        match document.decode() {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping inventory document: {}", e);
                rejected.push(e);
            }
        }
    }

    let duplicates = dedupe_by_id(&mut items);
    if duplicates > 0 {
        warn!("Snapshot repeated {} document ids", duplicates);
    }

    let count = items.len();
    let applied = state.send_if_modified(|current| {
        if current.status == SyncStatus::Stopped {
            return false;
        }
        current.items = items;
        current.rejected = rejected;
        current.status = SyncStatus::Live;
        current.revision += 1;
        true
    });
    if applied {
        debug!("Applied snapshot with {} items", count);
    }
}

fn degrade(state: &watch::Sender<SyncState>, err: SyncError) {
    error!("Inventory sync degraded: {}", err);
    set_status(state, SyncStatus::Degraded(err));
}

fn set_status(state: &watch::Sender<SyncState>, status: SyncStatus) {
    state.send_if_modified(|current| {
        // Only `start` leaves the stopped state
        let leaving_stop = current.status == SyncStatus::Stopped && status != SyncStatus::Connecting;
        if current.status == status || leaving_stop {
            return false;
        }
        current.status = status;
        current.revision += 1;
        true
    });
}

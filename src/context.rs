//! Inventory Screen Context
//!
//! Holds the filter state of one mounted screen and keeps the visible list
//! in step with it: every change to either the synchronized list or the
//! filter re-runs the filter and publishes the result.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{apply, FilterState, InventoryItem};
use crate::store::{SyncEngine, SyncState, SyncStatus};

/// What the screen renders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisibleItems {
    /// Filtered items in list order
    pub items: Vec<InventoryItem>,
    /// Size of the unfiltered list
    pub total: usize,
    pub status: SyncStatus,
    /// Revision of the list this was derived from
    pub revision: u64,
}

/// Filter state plus the derived visible list
pub struct InventoryContext {
    filter: watch::Sender<FilterState>,
    visible: watch::Receiver<VisibleItems>,
    task: JoinHandle<()>,
}

impl InventoryContext {
    /// Start deriving the visible list from `engine` under `filter`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(engine: &SyncEngine, filter: FilterState) -> Self {
        let (filter_tx, mut filter_rx) = watch::channel(filter);
        let mut list_rx = engine.watch();

        let initial = derive(&list_rx.borrow_and_update(), &filter_rx.borrow_and_update());
        let (visible_tx, visible_rx) = watch::channel(initial);
        let task = tokio::spawn(recompute(list_rx, filter_rx, visible_tx));

        Self {
            filter: filter_tx,
            visible: visible_rx,
            task,
        }
    }

    pub fn set_filter(&self, filter: FilterState) {
        self.filter.send_replace(filter);
    }

    pub fn update_filter(&self, modify: impl FnOnce(&mut FilterState)) {
        self.filter.send_modify(modify);
    }

    pub fn filter(&self) -> FilterState {
        self.filter.borrow().clone()
    }

    /// Latest derived list
    pub fn visible(&self) -> VisibleItems {
        self.visible.borrow().clone()
    }

    /// New observer of the derived list
    pub fn watch(&self) -> watch::Receiver<VisibleItems> {
        self.visible.clone()
    }
}

impl Drop for InventoryContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn derive(state: &SyncState, filter: &FilterState) -> VisibleItems {
    VisibleItems {
        items: apply(&state.items, filter),
        total: state.items.len(),
        status: state.status.clone(),
        revision: state.revision,
    }
}

async fn recompute(
    mut list_rx: watch::Receiver<SyncState>,
    mut filter_rx: watch::Receiver<FilterState>,
    visible_tx: watch::Sender<VisibleItems>,
) {
    loop {
        tokio::select! {
            changed = list_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = filter_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let next = {
            let state = list_rx.borrow_and_update();
            let filter = filter_rx.borrow_and_update();
            derive(&state, &filter)
        };
        if visible_tx.send(next).is_err() {
            break;
        }
    }
}

//! Error types for synchronization and mutations

use thiserror::Error;

use crate::repository::StoreError;

/// Failures of the synchronization engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("subscription could not be established: {0}")]
    Subscribe(StoreError),

    #[error("subscription interrupted: {0}")]
    Interrupted(StoreError),

    #[error("subscription already running")]
    AlreadyStarted,

    #[error("start cancelled by stop")]
    Cancelled,
}

/// Failures of the mutation gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("write failed: {0}")]
    Write(#[from] StoreError),
}

impl MutationError {
    /// Whether resubmitting unchanged may succeed; local state is untouched either way
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MutationError::Write(StoreError::Transport(_) | StoreError::Protocol(_) | StoreError::Closed)
        )
    }
}

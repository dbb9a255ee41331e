// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use delegation_kernel::{KernelError, RejectionReason};
use delegation_persistence::PersistenceError;
use thiserror::Error;

use crate::events::event_log::EventLogError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Rejected: {0}")]
    Rejected(RejectionReason),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] EventLogError),
    #[error("Kernel error: {0}")]
    Kernel(KernelError),
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl RegistryError {
    /// The domain rejection, if this is one.
    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            RegistryError::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<RejectionReason> for RegistryError {
    fn from(reason: RejectionReason) -> Self {
        RegistryError::Rejected(reason)
    }
}

impl From<KernelError> for RegistryError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::Rejected(reason) => RegistryError::Rejected(reason),
            other => RegistryError::Kernel(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint file error: {0}")]
    File(#[from] PersistenceError),
    #[error("Checkpoint body invalid: {0}")]
    Body(KernelError),
    #[error("Checkpoint header cursor {header} does not match body cursor {body}")]
    CursorMismatch { header: u64, body: u64 },
    #[error("Checkpoint is ahead of the log: cursor {cursor}, log head {head}")]
    AheadOfLog { cursor: u64, head: u64 },
    #[error("No checkpoint path configured")]
    NotConfigured,
}

//! Error taxonomy for the synchronous orchestrator surface.
//!
//! Failures inside the spawned lifecycle tasks never reach the original
//! caller; they end up in the persisted resource status instead.

use thiserror::Error;

use rig_ledger::StoreError;

/// Errors surfaced synchronously by the orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Request input is invalid; nothing was created.
    #[error("validation error: {0}")]
    Validation(String),

    /// A catalog or resource reference does not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store failed during the synchronous part of a request.
    #[error(transparent)]
    Store(#[from] StoreError),
}

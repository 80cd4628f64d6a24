//! Persistence capability consumed by the fleet services.
//!
//! The platform only ever needs row-level create/read/update plus a couple of
//! aggregate queries, so the capability is a single trait; the HTTP and
//! payment layers talk to the same surface. [`crate::MemoryStore`] is the
//! reference implementation.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{EntryKind, LedgerEntry, Resource, ResourceStatus, ServerConfig, Template};

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Status write that is not an edge of the lifecycle graph.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Persisted status at the time of the write.
        from: ResourceStatus,
        /// Rejected target status.
        to: ResourceStatus,
    },

    /// Underlying backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable store for resources, catalog entries, and the monetary ledger.
///
/// Ledger entries are append-only: there is deliberately no update or delete
/// surface for them. Status writes must follow the lifecycle graph; the
/// single-writer discipline in the orchestrator keeps writers from racing,
/// and implementations reject non-edges outright.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a freshly requested resource.
    async fn insert_resource(&self, resource: Resource) -> Result<(), StoreError>;

    /// Move a resource along one edge of the lifecycle graph.
    async fn update_resource_status(
        &self,
        id: Uuid,
        status: ResourceStatus,
    ) -> Result<(), StoreError>;

    /// Record the externally assigned address of a resource.
    async fn set_resource_address(&self, id: Uuid, address: &str) -> Result<(), StoreError>;

    /// Fetch a resource by id.
    async fn resource(&self, id: Uuid) -> Result<Resource, StoreError>;

    /// Fetch a resource by its cloud instance handle.
    async fn resource_by_handle(&self, handle: &str) -> Result<Resource, StoreError>;

    /// All resources currently in the given status, across owners.
    async fn resources_by_status(
        &self,
        status: ResourceStatus,
    ) -> Result<Vec<Resource>, StoreError>;

    /// All resources belonging to an owner, newest first.
    async fn resources_by_owner(&self, owner: Uuid) -> Result<Vec<Resource>, StoreError>;

    /// Append a ledger entry.
    async fn insert_entry(&self, entry: LedgerEntry) -> Result<(), StoreError>;

    /// Ledger history for an owner, optionally filtered by kind.
    async fn entries_by_owner(
        &self,
        owner: Uuid,
        kind: Option<EntryKind>,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Sum of entry amounts of one kind for an owner; `0.0` when there are none.
    async fn sum_entries(&self, owner: Uuid, kind: EntryKind) -> Result<f64, StoreError>;

    /// Resolve a server configuration from the catalog.
    async fn server_config(&self, id: Uuid) -> Result<ServerConfig, StoreError>;

    /// Resolve a template from the catalog.
    async fn template(&self, id: Uuid) -> Result<Template, StoreError>;

    /// The full server-configuration catalog, active entries first.
    async fn list_server_configs(&self) -> Result<Vec<ServerConfig>, StoreError>;

    /// The full template catalog, active entries first.
    async fn list_templates(&self) -> Result<Vec<Template>, StoreError>;
}
